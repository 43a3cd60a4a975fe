//! Runtime configuration
//!
//! Every knob is read from a `VERITAS_*` environment variable with a
//! default. The server binary overrides individual fields from CLI flags.

use std::path::PathBuf;
use std::time::Duration;

/// Default dashboard HTTP port
pub const DEFAULT_PORT: u16 = 3940;

/// Default feed tick interval (milliseconds)
pub const DEFAULT_FEED_INTERVAL_MS: u64 = 10_000;

/// Process-wide configuration
#[derive(Debug, Clone)]
pub struct VeritasConfig {
    /// Serve mock dashboard data instead of calling the backend
    pub api_mocking: bool,
    /// Record AI interactions into the persisted history
    pub ai_tracking_enabled: bool,
    /// Mirror AI interactions into the server log
    pub ai_server_logging: bool,
    /// Key expected in the `aeg-sas-key` header of Event Grid webhooks
    pub event_grid_key: Option<String>,
    /// Public base URL of the application
    pub app_url: String,
    /// Dashboard HTTP port
    pub port: u16,
    /// Custom directory for the persisted store
    pub data_dir: Option<PathBuf>,
    /// Live WebSocket endpoint for the real-time feeds
    pub feed_endpoint: Option<String>,
    /// Tick interval for simulated feeds
    pub feed_interval: Duration,
}

impl Default for VeritasConfig {
    fn default() -> Self {
        Self {
            api_mocking: true,
            ai_tracking_enabled: true,
            ai_server_logging: false,
            event_grid_key: None,
            app_url: format!("http://127.0.0.1:{}", DEFAULT_PORT),
            port: DEFAULT_PORT,
            data_dir: None,
            feed_endpoint: None,
            feed_interval: Duration::from_millis(DEFAULT_FEED_INTERVAL_MS),
        }
    }
}

impl VeritasConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| parse_flag(&v))
                .unwrap_or(default)
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = lookup("VERITAS_DASHBOARD_PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        Self {
            api_mocking: flag("VERITAS_API_MOCKING", defaults.api_mocking),
            ai_tracking_enabled: flag("VERITAS_AI_TRACKING_ENABLED", defaults.ai_tracking_enabled),
            ai_server_logging: flag("VERITAS_AI_SERVER_LOGGING", defaults.ai_server_logging),
            event_grid_key: non_empty("VERITAS_EVENT_GRID_KEY"),
            app_url: non_empty("VERITAS_APP_URL")
                .unwrap_or_else(|| format!("http://127.0.0.1:{}", port)),
            port,
            data_dir: non_empty("VERITAS_DATA_DIR").map(PathBuf::from),
            feed_endpoint: non_empty("VERITAS_FEED_ENDPOINT"),
            feed_interval: lookup("VERITAS_FEED_INTERVAL_MS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.feed_interval),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
