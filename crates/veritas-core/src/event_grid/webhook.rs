//! Webhook request validation
//!
//! Event Grid proves ownership of a webhook endpoint with a subscription
//! validation event; the endpoint answers by echoing the validation code.
//! Every other delivery must carry the `aeg-event-type` header.

use serde_json::Value;
use std::collections::HashMap;

use super::event::SUBSCRIPTION_VALIDATION_EVENT;

/// Header present on every Event Grid delivery
pub const EVENT_TYPE_HEADER: &str = "aeg-event-type";

/// Header carrying the shared access key
pub const SAS_KEY_HEADER: &str = "aeg-sas-key";

/// Incoming webhook request, transport independent
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    /// Header names are stored lowercase
    headers: HashMap<String, String>,
    pub body: Value,
}

impl WebhookRequest {
    pub fn new(body: Value) -> Self {
        Self {
            headers: HashMap::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Outcome of [`validate_request`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookValidation {
    /// Subscription handshake; respond with `{"validationResponse": code}`
    Handshake { validation_code: String },
    /// Regular delivery
    Valid,
    Invalid { reason: String },
}

/// Validate a webhook request. When `access_key` is set, regular deliveries
/// must also present it in the `aeg-sas-key` header.
pub fn validate_request(request: &WebhookRequest, access_key: Option<&str>) -> WebhookValidation {
    if let Some(code) = validation_code(&request.body) {
        return WebhookValidation::Handshake {
            validation_code: code,
        };
    }

    if request.header(EVENT_TYPE_HEADER).is_none() {
        return WebhookValidation::Invalid {
            reason: format!("missing {} header", EVENT_TYPE_HEADER),
        };
    }

    if let Some(expected) = access_key {
        if request.header(SAS_KEY_HEADER) != Some(expected) {
            return WebhookValidation::Invalid {
                reason: "access key mismatch".to_string(),
            };
        }
    }

    WebhookValidation::Valid
}

/// Extract the validation code from a handshake body (an array of events
/// or a single event).
fn validation_code(body: &Value) -> Option<String> {
    let first = match body {
        Value::Array(events) => events.first()?,
        Value::Object(_) => body,
        _ => return None,
    };

    if first.get("eventType").and_then(Value::as_str) != Some(SUBSCRIPTION_VALIDATION_EVENT) {
        return None;
    }

    first
        .get("data")
        .and_then(|d| d.get("validationCode"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
