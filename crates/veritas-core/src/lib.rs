//! # Veritas Core
//!
//! Real-time dashboard state engine behind the VeritasVault liquidity
//! management dashboard.
//!
//! - **Dashboard state**: per-section data (overview, performance, models,
//!   voting) with independent loading/error flags, refreshed through an
//!   injected [`DashboardService`]
//! - **Persisted settings**: key-wise merged [`DashboardSettings`] stored in a
//!   SQLite-backed key-value store (the browser local storage equivalent)
//! - **Event Grid**: in-memory topic pub/sub with filters, handler isolation
//!   and a bounded newest-first cache per topic
//! - **Real-time feeds**: voting, model, allocation and system feeds that
//!   follow a live WebSocket endpoint or fall back to simulated updates
//! - **AI history**: capped, switchable record of AI interactions, and an
//!   analyses loader with a deterministic fallback
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use veritas_core::{DashboardState, MockDashboardService, SettingsPatch, Store};
//!
//! let store = Arc::new(Store::new(None)?);
//! let dashboard = DashboardState::new(Arc::new(MockDashboardService::new()), store);
//!
//! // Load overview and performance concurrently
//! dashboard.initialize().await;
//!
//! // Merge a settings change and persist it
//! let settings = dashboard.update_settings(SettingsPatch {
//!     compact_view: Some(true),
//!     ..Default::default()
//! })?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): compile SQLite into the binary
//! - `live-feeds` (default): connect feeds to live WebSocket endpoints

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod ai_history;
pub mod analyses;
pub mod config;
pub mod dashboard;
pub mod event_grid;
pub mod feed;
pub mod historical;
pub mod sanitize;
pub mod store;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::VeritasConfig;

pub use store::{KeyValueStore, MemoryStore, Store, StoreError};

pub use dashboard::{
    is_valid_tab, DashboardError, DashboardEvent, DashboardOverview, DashboardPerformance,
    DashboardService, DashboardSettings, DashboardSnapshot, DashboardState,
    MockDashboardService, ModelResults, Section, SectionMap, SettingsPatch, Theme,
    VotingOverview, DASHBOARD_TABS, SETTINGS_KEY,
};

pub use event_grid::{
    event_matches_filter, DataFilter, EventFilter, EventGridError, EventGridEvent,
    EventGridService, EventPayload, EventSubscription, SubscriptionStatus, WebhookRequest,
    WebhookValidation, DEFAULT_MAX_CACHE_SIZE,
};

pub use feed::{
    AllocationData, AllocationFeed, DashboardData, Feed, FeedConfig, FeedError, FeedSource,
    FeedStatus, ModelCommand, ModelData, ModelFeed, SystemFeed, VotingData, VotingFeed,
};

pub use ai_history::{AiHistoryError, AiHistoryTracker, AiInteraction};
pub use analyses::{
    fallback_analyses, load_analyses, AiAnalysis, AnalysesResult, AnalysisSource,
    EmptyAnalysisSource, Session,
};
pub use historical::{generate_series, HistoricalPoint, HistoricalSeries};
pub use sanitize::sanitize_message;
