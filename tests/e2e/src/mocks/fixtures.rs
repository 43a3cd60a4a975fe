//! Event Fixtures
//!
//! Builders for Event Grid events used across the workflow tests.

use serde_json::{json, Value};
use veritas_core::event_grid::{
    PriceData, RiskAlertData, Severity, PRICE_UPDATE_EVENT, RISK_ALERT_EVENT,
    SUBSCRIPTION_VALIDATION_EVENT,
};
use veritas_core::{EventGridEvent, EventPayload};

/// Factory for test events
pub struct EventFixtures;

impl EventFixtures {
    /// Price update on `market-data`; `seq` ends up in the subject
    pub fn price_update(symbol: &str, price: f64, seq: usize) -> EventGridEvent {
        EventGridEvent::new(
            "market-data",
            PRICE_UPDATE_EVENT,
            format!("prices/{}/{}", symbol.to_ascii_lowercase(), seq),
            EventPayload::PriceUpdate(PriceData {
                symbol: symbol.to_string(),
                price,
                change_24h: 0.0,
                source: "fixture".to_string(),
            }),
        )
    }

    /// Risk alert on `risk-alerts` for `pool`
    pub fn risk_alert(pool: &str, severity: Severity, observed: f64) -> EventGridEvent {
        EventGridEvent::new(
            "risk-alerts",
            RISK_ALERT_EVENT,
            format!("pools/{}", pool),
            EventPayload::RiskAlert(RiskAlertData {
                severity,
                pool_id: pool.to_string(),
                metric: "utilization".to_string(),
                threshold: 0.8,
                observed,
                message: format!("{} utilization {:.2}", pool, observed),
            }),
        )
    }

    /// Free-form event with a JSON body
    pub fn custom(topic: &str, event_type: &str, subject: &str, data: Value) -> EventGridEvent {
        EventGridEvent::new(topic, event_type, subject, EventPayload::Custom(data))
    }

    /// Webhook body of a subscription validation handshake
    pub fn validation_handshake(code: &str) -> Value {
        json!([{
            "id": "validation-1",
            "topic": "/subscriptions/test/resourceGroups/veritas/providers/Microsoft.EventGrid/topics/market-data",
            "subject": "",
            "eventType": SUBSCRIPTION_VALIDATION_EVENT,
            "eventTime": "2024-05-01T12:00:00Z",
            "dataVersion": "1",
            "data": {
                "validationCode": code,
                "validationUrl": "https://rp-eastus.eventgrid.azure.net/validate"
            }
        }])
    }

    /// `count` price updates in publication order
    pub fn price_series(count: usize) -> Vec<EventGridEvent> {
        (0..count)
            .map(|i| Self::price_update("ETH", 3_000.0 + i as f64, i))
            .collect()
    }
}
