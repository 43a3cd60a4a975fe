//! Dashboard state container

use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::events::DashboardEvent;
use super::service::DashboardService;
use super::settings::{DashboardSettings, SettingsPatch, SETTINGS_KEY};
use super::types::{
    DashboardOverview, DashboardPerformance, ModelResults, Section, SectionMap, VotingOverview,
};
use super::DashboardError;
use crate::store::KeyValueStore;

/// Tabs the dashboard UI knows how to render
pub const DASHBOARD_TABS: &[&str] = &["overview", "performance", "models", "voting", "allocations"];

/// Tab selected on a fresh session
pub const DEFAULT_TAB: &str = "overview";

/// Capacity of the change-notification channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Check a tab name against [`DASHBOARD_TABS`].
///
/// The state container stores any string; consumers validate.
pub fn is_valid_tab(tab: &str) -> bool {
    DASHBOARD_TABS.contains(&tab)
}

/// Point-in-time copy of the whole dashboard state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub overview_data: Option<DashboardOverview>,
    pub performance_data: Option<DashboardPerformance>,
    pub model_results: Option<ModelResults>,
    pub voting_overview: Option<VotingOverview>,
    pub is_loading: SectionMap<bool>,
    pub errors: SectionMap<Option<String>>,
    pub settings: DashboardSettings,
    pub active_tab: String,
}

impl DashboardSnapshot {
    fn new(settings: DashboardSettings) -> Self {
        Self {
            overview_data: None,
            performance_data: None,
            model_results: None,
            voting_overview: None,
            is_loading: SectionMap::default(),
            errors: SectionMap::default(),
            settings,
            active_tab: DEFAULT_TAB.to_string(),
        }
    }
}

enum SectionData {
    Overview(DashboardOverview),
    Performance(DashboardPerformance),
    Models(ModelResults),
    Voting(VotingOverview),
}

struct Inner {
    service: Arc<dyn DashboardService>,
    store: Arc<dyn KeyValueStore>,
    snapshot: RwLock<DashboardSnapshot>,
    event_tx: broadcast::Sender<DashboardEvent>,
}

/// Shared dashboard state. Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct DashboardState {
    inner: Arc<Inner>,
}

impl DashboardState {
    /// Create the container, reading persisted settings from `store`.
    pub fn new(service: Arc<dyn DashboardService>, store: Arc<dyn KeyValueStore>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self::with_event_tx(service, store, event_tx)
    }

    /// Create the container publishing on an external event channel.
    pub fn with_event_tx(
        service: Arc<dyn DashboardService>,
        store: Arc<dyn KeyValueStore>,
        event_tx: broadcast::Sender<DashboardEvent>,
    ) -> Self {
        let settings = load_settings(store.as_ref());
        Self {
            inner: Arc::new(Inner {
                service,
                store,
                snapshot: RwLock::new(DashboardSnapshot::new(settings)),
                event_tx,
            }),
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Initial load: overview and performance, concurrently.
    pub async fn initialize(&self) {
        info!("Loading initial dashboard data");
        self.refresh_data(None).await;
    }

    /// Refresh one section, or overview and performance when `section` is
    /// `None`. Failures are recorded in the section's error slot; nothing is
    /// retried.
    pub async fn refresh_data(&self, section: Option<Section>) {
        match section {
            Some(section) => self.refresh_section(section).await,
            None => {
                tokio::join!(
                    self.refresh_section(Section::Overview),
                    self.refresh_section(Section::Performance),
                );
            }
        }
    }

    async fn refresh_section(&self, section: Section) {
        *self.write().is_loading.get_mut(section) = true;
        self.emit(DashboardEvent::SectionLoading {
            section,
            timestamp: Utc::now(),
        });

        let service = &self.inner.service;
        let result = match section {
            Section::Overview => service.fetch_overview().await.map(SectionData::Overview),
            Section::Performance => service.fetch_performance().await.map(SectionData::Performance),
            Section::Models => service.fetch_model_results().await.map(SectionData::Models),
            Section::Voting => service.fetch_voting_overview().await.map(SectionData::Voting),
        };

        match result {
            Ok(data) => {
                {
                    let mut snapshot = self.write();
                    match data {
                        SectionData::Overview(d) => snapshot.overview_data = Some(d),
                        SectionData::Performance(d) => snapshot.performance_data = Some(d),
                        SectionData::Models(d) => snapshot.model_results = Some(d),
                        SectionData::Voting(d) => snapshot.voting_overview = Some(d),
                    }
                    *snapshot.errors.get_mut(section) = None;
                    *snapshot.is_loading.get_mut(section) = false;
                }
                debug!(section = %section, "Dashboard section refreshed");
                self.emit(DashboardEvent::SectionUpdated {
                    section,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(section = %section, error = %e, "Dashboard section refresh failed");
                let message = section.error_message().to_string();
                {
                    let mut snapshot = self.write();
                    *snapshot.errors.get_mut(section) = Some(message.clone());
                    *snapshot.is_loading.get_mut(section) = false;
                }
                self.emit(DashboardEvent::SectionFailed {
                    section,
                    error: message,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Merge `patch` into the settings and persist the result.
    ///
    /// The in-memory settings are updated even when persisting fails; the
    /// error is returned so callers can surface it.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<DashboardSettings, DashboardError> {
        let merged = {
            let mut snapshot = self.write();
            let merged = snapshot.settings.merged(&patch);
            snapshot.settings = merged.clone();
            merged
        };

        self.emit(DashboardEvent::SettingsChanged {
            settings: merged.clone(),
            timestamp: Utc::now(),
        });

        let json = serde_json::to_string(&merged)?;
        if let Err(e) = self.inner.store.set(SETTINGS_KEY, &json) {
            warn!(error = %e, "Failed to persist dashboard settings");
            return Err(e.into());
        }

        Ok(merged)
    }

    /// Store the active tab. No validation happens here.
    pub fn set_active_tab(&self, tab: impl Into<String>) {
        let tab = tab.into();
        self.write().active_tab = tab.clone();
        self.emit(DashboardEvent::TabChanged {
            tab,
            timestamp: Utc::now(),
        });
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.read().clone()
    }

    pub fn settings(&self) -> DashboardSettings {
        self.read().settings.clone()
    }

    pub fn active_tab(&self) -> String {
        self.read().active_tab.clone()
    }

    pub fn is_loading(&self, section: Section) -> bool {
        *self.read().is_loading.get(section)
    }

    pub fn error(&self, section: Section) -> Option<String> {
        self.read().errors.get(section).clone()
    }

    pub fn overview(&self) -> Option<DashboardOverview> {
        self.read().overview_data.clone()
    }

    pub fn performance(&self) -> Option<DashboardPerformance> {
        self.read().performance_data.clone()
    }

    fn emit(&self, event: DashboardEvent) {
        // No receivers is fine
        let _ = self.inner.event_tx.send(event);
    }

    // Writes are plain field assignments; poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, DashboardSnapshot> {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardSnapshot> {
        self.inner
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn load_settings(store: &dyn KeyValueStore) -> DashboardSettings {
    match store.get(SETTINGS_KEY) {
        Ok(Some(json)) => DashboardSettings::from_json(&json).unwrap_or_else(|| {
            warn!("Stored dashboard settings are unreadable, using defaults");
            DashboardSettings::default()
        }),
        Ok(None) => DashboardSettings::default(),
        Err(e) => {
            warn!(error = %e, "Could not read dashboard settings, using defaults");
            DashboardSettings::default()
        }
    }
}
