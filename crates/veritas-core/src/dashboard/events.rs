//! Change notifications emitted by the dashboard state container.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::settings::DashboardSettings;
use super::types::Section;

/// Every state mutation emits one of these events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DashboardEvent {
    SectionLoading {
        section: Section,
        timestamp: DateTime<Utc>,
    },
    SectionUpdated {
        section: Section,
        timestamp: DateTime<Utc>,
    },
    SectionFailed {
        section: Section,
        error: String,
        timestamp: DateTime<Utc>,
    },
    SettingsChanged {
        settings: DashboardSettings,
        timestamp: DateTime<Utc>,
    },
    TabChanged {
        tab: String,
        timestamp: DateTime<Utc>,
    },
}

impl DashboardEvent {
    /// Section the event refers to, if any
    pub fn section(&self) -> Option<Section> {
        match self {
            DashboardEvent::SectionLoading { section, .. }
            | DashboardEvent::SectionUpdated { section, .. }
            | DashboardEvent::SectionFailed { section, .. } => Some(*section),
            _ => None,
        }
    }

    /// Serialize to JSON string for WebSocket transmission.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
