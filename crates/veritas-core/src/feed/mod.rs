//! Real-time Feeds
//!
//! A [`Feed`] is a uniform handle over one domain data stream (voting,
//! model runs, allocations, system health). On start it resolves the
//! source's initial data, then either follows a live WebSocket endpoint or,
//! when none is configured or reachable, ticks a simulated generator every
//! `update_interval`.
//!
//! The background task is owned by the handle: [`Feed::stop`] or dropping
//! the handle cancels it, [`Feed::reconnect`] discards state and starts over.

mod live;
mod payloads;
mod sources;

pub use payloads::{
    AllocationData, DashboardData, FeedBase, FeedStatus, ModelData, ModelMetrics, Proposal,
    SystemHealth, VotingData,
};
pub use sources::{AllocationFeed, ModelCommand, ModelFeed, SystemFeed, VotingFeed};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_FEED_INTERVAL_MS;

/// Feed error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Stream ended")]
    StreamEnded,

    #[error("Initial data unavailable: {0}")]
    Initial(String),

    #[error("No data yet")]
    NoData,

    #[error("Unknown proposal: {0}")]
    UnknownProposal(String),

    #[error("Proposal closed: {0}")]
    ProposalClosed(String),

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Invalid vote: {0}")]
    InvalidVote(String),
}

/// Producer of one domain's data
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    type Data: Clone + Send + Sync + Serialize + DeserializeOwned + 'static;

    /// Short domain name, used in logs and endpoint paths
    fn domain(&self) -> &'static str;

    /// First snapshot, possibly fetched
    async fn initial_data(&self) -> Result<Self::Data, FeedError>;

    /// Simulated successor of `prev`
    fn next_update(&self, prev: &Self::Data) -> Self::Data;
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Live WebSocket endpoint; `None` always simulates
    pub endpoint: Option<String>,
    pub update_interval: Duration,
    pub connect_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            update_interval: Duration::from_millis(DEFAULT_FEED_INTERVAL_MS),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl FeedConfig {
    pub fn simulated(update_interval: Duration) -> Self {
        Self {
            update_interval,
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

type Snapshot<S> = Option<<S as FeedSource>::Data>;

/// Handle to a running feed
pub struct Feed<S: FeedSource> {
    source: Arc<S>,
    config: FeedConfig,
    tx: Arc<watch::Sender<Snapshot<S>>>,
    simulated: Arc<AtomicBool>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: FeedSource> Feed<S> {
    /// Start a feed. Must be called inside a tokio runtime.
    pub fn spawn(source: S, config: FeedConfig) -> Self {
        let (tx, _) = watch::channel(None);
        let feed = Self {
            source: Arc::new(source),
            config,
            tx: Arc::new(tx),
            simulated: Arc::new(AtomicBool::new(false)),
            outbound: Mutex::new(None),
            task: Mutex::new(None),
        };
        feed.start();
        feed
    }

    fn start(&self) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        *lock(&self.outbound) = Some(out_tx);

        let handle = tokio::spawn(run(
            self.source.clone(),
            self.config.clone(),
            self.tx.clone(),
            self.simulated.clone(),
            out_rx,
        ));

        if let Some(previous) = lock(&self.task).replace(handle) {
            previous.abort();
        }
    }

    /// Latest snapshot
    pub fn data(&self) -> Option<S::Data> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn watch(&self) -> watch::Receiver<Snapshot<S>> {
        self.tx.subscribe()
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Replace the snapshot. The simulator continues from this value.
    pub fn set_data(&self, data: S::Data) {
        self.tx.send_replace(Some(data));
    }

    /// Modify the current snapshot in place; `false` when there is none yet.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut S::Data),
    {
        let mut applied = false;
        self.tx.send_if_modified(|current| match current {
            Some(data) => {
                f(data);
                applied = true;
                true
            }
            None => false,
        });
        applied
    }

    /// Discard the current state and initialize again
    pub fn reconnect(&self) {
        info!(domain = self.source.domain(), "Reconnecting feed");
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
        self.tx.send_replace(None);
        self.simulated.store(false, Ordering::SeqCst);
        self.start();
    }

    /// Cancel the background task; the last snapshot stays readable
    pub fn stop(&self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
            debug!(domain = self.source.domain(), "Feed stopped");
        }
        lock(&self.outbound).take();
    }

    pub fn is_running(&self) -> bool {
        lock(&self.task)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Forward a message to the live endpoint. Dropped while simulated.
    fn send_outbound(&self, message: String) {
        if self.is_simulated() {
            return;
        }
        if let Some(tx) = lock(&self.outbound).as_ref() {
            let _ = tx.send(message);
        }
    }
}

impl<S: FeedSource> Drop for Feed<S> {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run<S: FeedSource>(
    source: Arc<S>,
    config: FeedConfig,
    tx: Arc<watch::Sender<Snapshot<S>>>,
    simulated: Arc<AtomicBool>,
    outbound: mpsc::UnboundedReceiver<String>,
) {
    let domain = source.domain();

    match source.initial_data().await {
        Ok(initial) => {
            tx.send_replace(Some(initial));
        }
        Err(e) => warn!(domain, error = %e, "Initial feed data unavailable"),
    }

    if let Some(endpoint) = config.endpoint.as_deref() {
        match live::follow::<S::Data>(endpoint, config.connect_timeout, &tx, &simulated, outbound)
            .await
        {
            Ok(()) => return,
            Err(e) => warn!(domain, endpoint, error = %e, "Live feed unavailable, simulating"),
        }
    }

    simulated.store(true, Ordering::SeqCst);
    info!(domain, interval_ms = config.update_interval.as_millis() as u64, "Simulating feed");

    let mut ticker = tokio::time::interval(config.update_interval);
    // Skip the immediate first tick
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let current = tx.borrow().clone();
        let next = match current {
            Some(prev) => source.next_update(&prev),
            None => match source.initial_data().await {
                Ok(initial) => initial,
                Err(e) => {
                    debug!(domain, error = %e, "Initial feed data still unavailable");
                    continue;
                }
            },
        };
        tx.send_replace(Some(next));
    }
}
