//! Dashboard Module
//!
//! Process-wide dashboard state container:
//! - Section snapshots (overview, performance, models, voting) refreshed
//!   through an injected [`DashboardService`]
//! - Independent loading/error flags per section, stale data kept on error
//! - Persisted, key-wise merged [`DashboardSettings`]
//! - Active UI tab
//!
//! Every change is broadcast as a [`DashboardEvent`].

mod events;
mod service;
mod settings;
mod state;
mod types;

pub use events::DashboardEvent;
pub use service::{DashboardService, MockDashboardService};
pub use settings::{
    DashboardSettings, RefreshRates, RefreshRatesPatch, SettingsPatch, Theme, VisibleMetrics,
    VisibleMetricsPatch, SETTINGS_KEY,
};
pub use state::{is_valid_tab, DashboardSnapshot, DashboardState, DASHBOARD_TABS, DEFAULT_TAB};
pub use types::{
    AssetPerformance, DashboardOverview, DashboardPerformance, ModelResults, ModelSummary,
    PerformancePoint, PortfolioValue, ProposalSummary, RiskScore, Section, SectionMap,
    StrategySummary, VotingOverview,
};

use crate::store::StoreError;

/// Dashboard error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Backend request failed
    #[error("Fetch failed: {0}")]
    Fetch(String),
    /// Settings could not be persisted
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
