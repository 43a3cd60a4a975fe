//! Event Grid workflow tests: cache bounds, subscriptions, filtered handlers
//! and webhook validation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use veritas_core::event_grid::{
    parse_events, Severity, EVENT_TYPE_HEADER, PRICE_UPDATE_EVENT, RISK_ALERT_EVENT,
    SAS_KEY_HEADER,
};
use veritas_core::{
    EventFilter, EventGridService, SubscriptionStatus, WebhookRequest, WebhookValidation,
};
use veritas_e2e_tests::EventFixtures;

// ============================================================================
// CACHE
// ============================================================================

#[test]
fn test_cache_keeps_newest_hundred() {
    let grid = EventGridService::new();
    let series = EventFixtures::price_series(150);
    let ids: Vec<String> = series.iter().map(|e| e.id.clone()).collect();

    for event in series {
        grid.process_event(event);
    }

    let recent = grid.get_recent_events("market-data", 1_000);
    assert_eq!(recent.len(), 100);
    assert_eq!(recent[0].id, ids[149]);
    assert_eq!(recent[99].id, ids[50]);

    let limited = grid.get_recent_events("market-data", 3);
    let limited_ids: Vec<&str> = limited.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(limited_ids, vec![ids[149].as_str(), ids[148].as_str(), ids[147].as_str()]);
}

#[test]
fn test_caches_are_per_topic() {
    let grid = EventGridService::with_cache_size(5);
    for event in EventFixtures::price_series(8) {
        grid.process_event(event);
    }
    grid.process_event(EventFixtures::risk_alert("pool-a", Severity::Critical, 0.93));

    assert_eq!(grid.get_recent_events("market-data", 100).len(), 5);
    assert_eq!(grid.get_recent_events("risk-alerts", 100).len(), 1);
    assert!(grid.get_recent_events("governance", 100).is_empty());
}

// ============================================================================
// SUBSCRIPTIONS
// ============================================================================

#[test]
fn test_subscribe_then_unsubscribe() {
    let grid = EventGridService::new();
    let filter = EventFilter::event_type(RISK_ALERT_EVENT).with_subject_prefix("pools/");

    let sub = grid.subscribe_to_topic("risk-alerts", "https://hooks.example.com/risk", Some(filter.clone()));
    assert!(!sub.id.is_empty());
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.filter, Some(filter));
    assert_eq!(grid.list_subscriptions(Some("risk-alerts")).len(), 1);
    assert!(grid.list_subscriptions(Some("market-data")).is_empty());

    assert!(grid.unsubscribe_from_topic(&sub.id));
    assert!(grid.list_subscriptions(None).is_empty());

    // Unknown ids succeed too
    assert!(grid.unsubscribe_from_topic("does-not-exist"));
}

// ============================================================================
// HANDLERS
// ============================================================================

#[test]
fn test_filter_conditions_all_apply() {
    let grid = EventGridService::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    grid.register_event_handler(
        "models",
        move |event| {
            sink.lock().unwrap().push(event.subject.clone());
            Ok(())
        },
        Some(
            EventFilter::event_type("VeritasVault.Model.Completed")
                .with_subject_prefix("models/")
                .with_subject_suffix("/final")
                .with_data("result.metrics.sharpe", json!(1.4)),
        ),
    );

    let completed = |subject: &str, sharpe: f64| {
        EventFixtures::custom(
            "models",
            "VeritasVault.Model.Completed",
            subject,
            json!({"result": {"metrics": {"sharpe": sharpe}}}),
        )
    };

    assert_eq!(grid.process_event(completed("models/bl/final", 1.4)), 1);
    // Wrong nested value
    assert_eq!(grid.process_event(completed("models/bl/final", 0.9)), 0);
    // Wrong suffix
    assert_eq!(grid.process_event(completed("models/bl/draft", 1.4)), 0);
    // Wrong prefix
    assert_eq!(grid.process_event(completed("runs/bl/final", 1.4)), 0);
    // Wrong type
    assert_eq!(
        grid.process_event(EventFixtures::custom(
            "models",
            "VeritasVault.Model.Started",
            "models/bl/final",
            json!({"result": {"metrics": {"sharpe": 1.4}}}),
        )),
        0
    );

    assert_eq!(*seen.lock().unwrap(), vec!["models/bl/final".to_string()]);
    // Every event is cached regardless of filters
    assert_eq!(grid.get_recent_events("models", 100).len(), 5);
}

#[test]
fn test_failing_and_panicking_handlers_are_isolated() {
    let grid = EventGridService::new();
    let healthy = Arc::new(AtomicUsize::new(0));

    grid.register_event_handler("market-data", |_| Err("downstream rejected".to_string()), None);
    grid.register_event_handler("market-data", |_| panic!("handler bug"), None);
    let counter = healthy.clone();
    grid.register_event_handler(
        "market-data",
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Some(EventFilter::event_type(PRICE_UPDATE_EVENT)),
    );

    let delivered = grid.process_event(EventFixtures::price_update("BTC", 64_000.0, 0));
    assert_eq!(delivered, 1);
    assert_eq!(healthy.load(Ordering::SeqCst), 1);

    // The grid keeps working after a handler panic
    grid.process_event(EventFixtures::price_update("BTC", 64_100.0, 1));
    assert_eq!(healthy.load(Ordering::SeqCst), 2);
    assert_eq!(grid.get_recent_events("market-data", 10).len(), 2);
}

#[test]
fn test_unregistered_handler_stops_receiving() {
    let grid = EventGridService::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let id = grid.register_event_handler(
        "risk-alerts",
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        None,
    );

    grid.process_event(EventFixtures::risk_alert("pool-b", Severity::Warning, 0.81));
    assert!(grid.unregister_event_handler("risk-alerts", &id));
    grid.process_event(EventFixtures::risk_alert("pool-b", Severity::Warning, 0.85));

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(grid.handler_count("risk-alerts"), 0);
}

#[tokio::test]
async fn test_processed_events_are_broadcast() {
    let grid = EventGridService::new();
    let mut rx = grid.subscribe_events();

    let event = EventFixtures::risk_alert("pool-c", Severity::Critical, 0.99);
    grid.process_event(event.clone());

    assert_eq!(rx.recv().await.unwrap(), event);
}

// ============================================================================
// WEBHOOK
// ============================================================================

#[test]
fn test_validation_handshake_echoes_code() {
    let grid = EventGridService::new();
    let request = WebhookRequest::new(EventFixtures::validation_handshake("512d38b6-c7b8-40c8-89fe-f46f9e9622b6"));

    assert_eq!(
        grid.validate_webhook_request(&request),
        WebhookValidation::Handshake {
            validation_code: "512d38b6-c7b8-40c8-89fe-f46f9e9622b6".to_string()
        }
    );
}

#[test]
fn test_delivery_requires_event_type_header_and_key() {
    let grid = EventGridService::new().with_access_key(Some("s3cret".to_string()));
    let body = serde_json::to_value(vec![EventFixtures::price_update("ETH", 3_100.0, 0)]).unwrap();

    let bare = WebhookRequest::new(body.clone());
    assert!(matches!(
        grid.validate_webhook_request(&bare),
        WebhookValidation::Invalid { .. }
    ));

    let wrong_key = WebhookRequest::new(body.clone())
        .with_header(EVENT_TYPE_HEADER, "Notification")
        .with_header(SAS_KEY_HEADER, "guess");
    assert!(matches!(
        grid.validate_webhook_request(&wrong_key),
        WebhookValidation::Invalid { .. }
    ));

    let ok = WebhookRequest::new(body.clone())
        .with_header(EVENT_TYPE_HEADER, "Notification")
        .with_header(SAS_KEY_HEADER, "s3cret");
    assert_eq!(grid.validate_webhook_request(&ok), WebhookValidation::Valid);

    let events = parse_events(body).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, PRICE_UPDATE_EVENT);
    assert_eq!(events[0].field_value("symbol"), Some(json!("ETH")));
}
