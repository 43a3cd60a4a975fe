//! Subscription and handler filters
//!
//! All specified conditions must hold. A missing filter, or one with no
//! conditions set, matches every event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::EventGridEvent;

/// Equality check on one nested payload field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFilter {
    /// Dotted path into the event data, e.g. `"metrics.sharpe"`
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub subject_begins_with: Option<String>,
    pub subject_ends_with: Option<String>,
    pub data_filter: Option<DataFilter>,
}

impl EventFilter {
    pub fn event_type(event_type: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Default::default()
        }
    }

    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_begins_with = Some(prefix.into());
        self
    }

    pub fn with_subject_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.subject_ends_with = Some(suffix.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data_filter = Some(DataFilter {
            key: key.into(),
            value,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.event_type.is_none()
            && self.subject_begins_with.is_none()
            && self.subject_ends_with.is_none()
            && self.data_filter.is_none()
    }

    pub fn matches(&self, event: &EventGridEvent) -> bool {
        if let Some(event_type) = &self.event_type {
            if event.event_type != *event_type {
                return false;
            }
        }

        if let Some(prefix) = &self.subject_begins_with {
            if !event.subject.starts_with(prefix.as_str()) {
                return false;
            }
        }

        if let Some(suffix) = &self.subject_ends_with {
            if !event.subject.ends_with(suffix.as_str()) {
                return false;
            }
        }

        if let Some(data_filter) = &self.data_filter {
            match event.field_value(&data_filter.key) {
                Some(actual) if actual == data_filter.value => {}
                _ => return false,
            }
        }

        true
    }
}

/// `true` when `filter` is absent or every condition it sets holds
pub fn event_matches_filter(event: &EventGridEvent, filter: Option<&EventFilter>) -> bool {
    filter.is_none_or(|f| f.matches(event))
}
