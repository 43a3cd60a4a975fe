//! Event Grid Module
//!
//! In-memory simulation of a topic-based event bus:
//! - Webhook subscription records per topic
//! - In-process handlers with optional [`EventFilter`]s
//! - A bounded, newest-first event cache per topic
//! - Subscription validation handshake for webhook endpoints
//! - A timer-driven [`simulator`] producing sample traffic

mod event;
mod filter;
mod service;
pub mod simulator;
mod webhook;

pub use event::{
    lookup_path, EventGridEvent, EventPayload, GovernanceVoteData, ModelRunData, PriceData,
    RiskAlertData, Severity, TransactionData, GOVERNANCE_VOTE_EVENT, MODEL_COMPLETED_EVENT,
    PRICE_UPDATE_EVENT, RISK_ALERT_EVENT, SUBSCRIPTION_VALIDATION_EVENT, TRANSACTION_EVENT,
};
pub use filter::{event_matches_filter, DataFilter, EventFilter};
pub use service::{EventCallback, EventGridService, TopicInfo, DEFAULT_MAX_CACHE_SIZE};
pub use webhook::{
    validate_request, WebhookRequest, WebhookValidation, EVENT_TYPE_HEADER, SAS_KEY_HEADER,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event Grid error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EventGridError {
    /// Webhook body is not an event or array of events
    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),
    /// JSON error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Disabled,
}

/// Webhook subscription record, held in process memory only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscription {
    pub id: String,
    pub topic_name: String,
    pub endpoint: String,
    pub filter: Option<EventFilter>,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

/// Decode a webhook body: either one event or an array of events.
pub fn parse_events(body: serde_json::Value) -> Result<Vec<EventGridEvent>, EventGridError> {
    match body {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(EventGridError::from))
            .collect(),
        obj @ serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(obj)?]),
        other => Err(EventGridError::InvalidPayload(format!(
            "expected object or array, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
