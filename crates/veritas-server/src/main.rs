//! VeritasVault Dashboard Server
//!
//! Serves the real-time dashboard state layer over HTTP and WebSocket:
//! - Section state with independent loading/error flags
//! - Persisted, key-wise merged settings
//! - Event Grid topics, subscriptions and webhook handshake
//! - Voting, model, allocation and system feeds (live or simulated)

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use veritas_core::event_grid::simulator;
use veritas_core::{Store, VeritasConfig};
use veritas_server::dashboard::{self, state::AppState};

/// VeritasVault dashboard server
#[derive(Parser, Debug)]
#[command(name = "veritas-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time dashboard state, Event Grid and feed server for VeritasVault")]
struct Args {
    /// Custom data directory for the persisted store
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// HTTP port (overrides VERITAS_DASHBOARD_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Serve sample dashboard data (overrides VERITAS_API_MOCKING)
    #[arg(long)]
    mock: bool,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments first (before logging init, so --help/--version work cleanly)
    let args = Args::parse();

    init_logging(args.json_logs);

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.with_ansi(false).init();
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = VeritasConfig::from_env();
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.mock {
        config.api_mocking = true;
    }

    info!("VeritasVault server v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = Store::new(config.data_dir.clone()).context("Failed to initialize store")?;
    info!(path = %store.path().display(), "Store initialized");

    let api_mocking = config.api_mocking;
    let feed_interval = config.feed_interval;
    let state = AppState::new(config, Arc::new(store));

    // Initial load, like a dashboard mount
    {
        let dashboard_state = state.dashboard.clone();
        tokio::spawn(async move {
            dashboard_state.initialize().await;
        });
    }

    // Sample Event Grid traffic while mocking
    let producer = api_mocking.then(|| {
        info!("Simulated Event Grid producer enabled");
        simulator::spawn_producer(state.event_grid.clone(), feed_interval)
    });

    let feeds = state.feeds.clone();
    let result = tokio::select! {
        served = dashboard::serve(state) => served.context("Dashboard server error"),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    if let Some(handle) = producer {
        handle.abort();
    }
    feeds.stop();
    info!("VeritasVault server shutting down");
    result
}
