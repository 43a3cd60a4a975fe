//! Dashboard shared state

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::info;

use veritas_core::{
    AiHistoryTracker, AllocationFeed, AnalysisSource, DashboardError, DashboardEvent,
    DashboardOverview, DashboardPerformance, DashboardService, DashboardState, EmptyAnalysisSource,
    EventGridService, Feed, FeedConfig, KeyValueStore, MockDashboardService, ModelFeed,
    ModelResults, SystemFeed, VeritasConfig, VotingFeed, VotingOverview,
};

/// Dashboard event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// The four real-time feeds, started together
pub struct Feeds {
    pub voting: Feed<VotingFeed>,
    pub model: Feed<ModelFeed>,
    pub allocation: Feed<AllocationFeed>,
    pub system: Feed<SystemFeed>,
}

impl Feeds {
    /// Spawn every feed. `endpoint` is a base URL; each feed appends
    /// `/feeds/<domain>`.
    pub fn spawn(config: &VeritasConfig) -> Self {
        let feed_config = |domain: &str| {
            let base = FeedConfig::simulated(config.feed_interval);
            match config.feed_endpoint.as_deref() {
                Some(endpoint) => {
                    base.with_endpoint(format!("{}/feeds/{}", endpoint.trim_end_matches('/'), domain))
                }
                None => base,
            }
        };

        Self {
            voting: Feed::spawn(VotingFeed, feed_config("voting")),
            model: Feed::spawn(ModelFeed::default(), feed_config("model")),
            allocation: Feed::spawn(AllocationFeed, feed_config("allocation")),
            system: Feed::spawn(
                SystemFeed::new(config.feed_interval.as_secs().max(1)),
                feed_config("dashboard"),
            ),
        }
    }

    /// Number of feeds currently running on simulated data
    pub fn simulated_count(&self) -> usize {
        [
            self.voting.is_simulated(),
            self.model.is_simulated(),
            self.allocation.is_simulated(),
            self.system.is_simulated(),
        ]
        .into_iter()
        .filter(|simulated| *simulated)
        .count()
    }

    pub fn stop(&self) {
        self.voting.stop();
        self.model.stop();
        self.allocation.stop();
        self.system.stop();
    }
}

/// Shared application state for the dashboard
#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardState,
    pub event_grid: Arc<EventGridService>,
    pub feeds: Arc<Feeds>,
    pub ai_history: Arc<AiHistoryTracker>,
    pub analyses: Arc<dyn AnalysisSource>,
    pub config: Arc<VeritasConfig>,
    pub start_time: Instant,
}

impl AppState {
    /// Build the state from configuration. Must be called inside a tokio
    /// runtime (feeds are spawned immediately).
    pub fn new(config: VeritasConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self::with_event_tx(config, store, event_tx)
    }

    /// Build the state publishing dashboard changes on an external channel.
    pub fn with_event_tx(
        config: VeritasConfig,
        store: Arc<dyn KeyValueStore>,
        event_tx: broadcast::Sender<DashboardEvent>,
    ) -> Self {
        let service: Arc<dyn DashboardService> = if config.api_mocking {
            info!("API mocking enabled, serving sample dashboard data");
            Arc::new(MockDashboardService::new())
        } else {
            Arc::new(UnconfiguredBackend)
        };
        Self::with_services(config, store, service, Arc::new(EmptyAnalysisSource), event_tx)
    }

    /// Build the state around explicit backends
    pub fn with_services(
        config: VeritasConfig,
        store: Arc<dyn KeyValueStore>,
        service: Arc<dyn DashboardService>,
        analyses: Arc<dyn AnalysisSource>,
        event_tx: broadcast::Sender<DashboardEvent>,
    ) -> Self {
        let dashboard = DashboardState::with_event_tx(service, store.clone(), event_tx);
        let event_grid =
            Arc::new(EventGridService::new().with_access_key(config.event_grid_key.clone()));
        let ai_history = Arc::new(AiHistoryTracker::new(
            store,
            config.ai_tracking_enabled,
            config.ai_server_logging,
        ));
        let feeds = Arc::new(Feeds::spawn(&config));

        Self {
            dashboard,
            event_grid,
            feeds,
            ai_history,
            analyses,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}

/// Backend used when mocking is off and no dashboard API is wired in.
/// Every section refresh fails and shows its error message.
struct UnconfiguredBackend;

impl UnconfiguredBackend {
    fn unavailable<T>() -> Result<T, DashboardError> {
        Err(DashboardError::Fetch(
            "no dashboard backend configured (enable VERITAS_API_MOCKING)".to_string(),
        ))
    }
}

#[async_trait]
impl DashboardService for UnconfiguredBackend {
    async fn fetch_overview(&self) -> Result<DashboardOverview, DashboardError> {
        Self::unavailable()
    }

    async fn fetch_performance(&self) -> Result<DashboardPerformance, DashboardError> {
        Self::unavailable()
    }

    async fn fetch_model_results(&self) -> Result<ModelResults, DashboardError> {
        Self::unavailable()
    }

    async fn fetch_voting_overview(&self) -> Result<VotingOverview, DashboardError> {
        Self::unavailable()
    }
}
