//! Event Grid event envelope and typed payloads
//!
//! The envelope follows the Event Grid schema (`id`, `topic`, `subject`,
//! `eventType`, `eventTime`, `dataVersion`, `data`). `data` is decoded into
//! an [`EventPayload`] variant chosen by `eventType`; unknown types keep the
//! raw JSON in [`EventPayload::Custom`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const TRANSACTION_EVENT: &str = "VeritasVault.Blockchain.Transaction";
pub const PRICE_UPDATE_EVENT: &str = "VeritasVault.Market.PriceUpdate";
pub const RISK_ALERT_EVENT: &str = "VeritasVault.Risk.Alert";
pub const MODEL_COMPLETED_EVENT: &str = "VeritasVault.Model.Completed";
pub const GOVERNANCE_VOTE_EVENT: &str = "VeritasVault.Governance.Vote";

/// Sent by Event Grid when a webhook subscription is created
pub const SUBSCRIPTION_VALIDATION_EVENT: &str = "Microsoft.EventGrid.SubscriptionValidationEvent";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub tx_hash: String,
    pub chain: String,
    pub from: String,
    pub to: String,
    pub value: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub symbol: String,
    pub price: f64,
    pub change_24h: f64,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlertData {
    pub severity: Severity,
    pub pool_id: String,
    pub metric: String,
    pub threshold: f64,
    pub observed: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRunData {
    pub model_id: String,
    pub run_id: String,
    pub status: String,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceVoteData {
    pub proposal_id: String,
    pub voter: String,
    pub support: bool,
    pub weight: f64,
}

/// Typed event body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    BlockchainTransaction(TransactionData),
    PriceUpdate(PriceData),
    RiskAlert(RiskAlertData),
    ModelCompleted(ModelRunData),
    GovernanceVote(GovernanceVoteData),
    Custom(Value),
}

impl EventPayload {
    /// Decode raw JSON according to the event type. Bodies that do not fit
    /// the expected shape are kept as [`EventPayload::Custom`].
    pub fn from_event_type(event_type: &str, data: Value) -> Self {
        fn typed<T: serde::de::DeserializeOwned>(
            data: Value,
            wrap: fn(T) -> EventPayload,
        ) -> EventPayload {
            match serde_json::from_value::<T>(data.clone()) {
                Ok(v) => wrap(v),
                Err(_) => EventPayload::Custom(data),
            }
        }

        match event_type {
            TRANSACTION_EVENT => typed(data, EventPayload::BlockchainTransaction),
            PRICE_UPDATE_EVENT => typed(data, EventPayload::PriceUpdate),
            RISK_ALERT_EVENT => typed(data, EventPayload::RiskAlert),
            MODEL_COMPLETED_EVENT => typed(data, EventPayload::ModelCompleted),
            GOVERNANCE_VOTE_EVENT => typed(data, EventPayload::GovernanceVote),
            _ => EventPayload::Custom(data),
        }
    }

    /// JSON view of the payload, as it appears on the wire
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Look up a nested field by dotted path (`"metrics.sharpe"`,
    /// `"items.0.id"`). Numeric segments index into arrays.
    pub fn field(&self, path: &str) -> Option<Value> {
        let root = self.to_value();
        lookup_path(&root, path).cloned()
    }
}

/// Walk `path` through `value`
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// An event flowing through the grid. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawEvent")]
pub struct EventGridEvent {
    pub id: String,
    pub topic: String,
    pub subject: String,
    pub event_type: String,
    pub event_time: DateTime<Utc>,
    pub data_version: String,
    pub data: EventPayload,
}

impl EventGridEvent {
    /// Fabricate a new event with a fresh id and the current time
    pub fn new(
        topic: impl Into<String>,
        event_type: impl Into<String>,
        subject: impl Into<String>,
        data: EventPayload,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: topic.into(),
            subject: subject.into(),
            event_type: event_type.into(),
            event_time: Utc::now(),
            data_version: "1.0".to_string(),
            data,
        }
    }

    /// Nested payload field by dotted path
    pub fn field_value(&self, path: &str) -> Option<Value> {
        self.data.field(path)
    }

    /// Serialize to JSON string for WebSocket transmission.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Wire shape used for decoding
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    subject: String,
    event_type: String,
    #[serde(default)]
    event_time: Option<DateTime<Utc>>,
    #[serde(default)]
    data_version: Option<String>,
    #[serde(default)]
    data: Value,
}

impl From<RawEvent> for EventGridEvent {
    fn from(raw: RawEvent) -> Self {
        let data = EventPayload::from_event_type(&raw.event_type, raw.data);
        Self {
            id: raw.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            topic: raw.topic,
            subject: raw.subject,
            event_type: raw.event_type,
            event_time: raw.event_time.unwrap_or_else(Utc::now),
            data_version: raw.data_version.unwrap_or_else(|| "1.0".to_string()),
            data,
        }
    }
}
