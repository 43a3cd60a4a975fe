//! Simulated event producer
//!
//! Publishes plausible market, risk and governance events on a timer so the
//! dashboard has traffic while no real Event Grid topic is attached.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use super::event::{
    EventGridEvent, EventPayload, GovernanceVoteData, PriceData, RiskAlertData, Severity,
    GOVERNANCE_VOTE_EVENT, PRICE_UPDATE_EVENT, RISK_ALERT_EVENT,
};
use super::service::EventGridService;

const SYMBOLS: &[(&str, f64)] = &[("ETH", 3_150.0), ("BTC", 64_000.0), ("LINK", 14.5)];
const POOLS: &[&str] = &["eth-usdc-005", "wbtc-eth-03", "usdc-usdt-001"];

/// One random event
pub fn random_event() -> EventGridEvent {
    let mut rng = rand::thread_rng();

    match rng.gen_range(0..10) {
        // Prices dominate real traffic
        0..=6 => {
            let (symbol, base) = SYMBOLS[rng.gen_range(0..SYMBOLS.len())];
            let change = rng.gen_range(-6.0..6.0_f64);
            EventGridEvent::new(
                "market-data",
                PRICE_UPDATE_EVENT,
                format!("prices/{}", symbol.to_ascii_lowercase()),
                EventPayload::PriceUpdate(PriceData {
                    symbol: symbol.to_string(),
                    price: (base * (1.0 + change / 100.0) * 100.0).round() / 100.0,
                    change_24h: (change * 100.0).round() / 100.0,
                    source: "simulator".to_string(),
                }),
            )
        }
        7..=8 => {
            let pool = POOLS[rng.gen_range(0..POOLS.len())];
            let observed = rng.gen_range(0.5..1.0_f64);
            let severity = if observed > 0.9 {
                Severity::Critical
            } else if observed > 0.75 {
                Severity::Warning
            } else {
                Severity::Info
            };
            EventGridEvent::new(
                "risk-alerts",
                RISK_ALERT_EVENT,
                format!("pools/{}", pool),
                EventPayload::RiskAlert(RiskAlertData {
                    severity,
                    pool_id: pool.to_string(),
                    metric: "utilization".to_string(),
                    threshold: 0.75,
                    observed,
                    message: format!("Utilization of {} at {:.0}%", pool, observed * 100.0),
                }),
            )
        }
        _ => {
            let proposal = rng.gen_range(12..15);
            EventGridEvent::new(
                "governance-events",
                GOVERNANCE_VOTE_EVENT,
                format!("proposals/prop-{}", proposal),
                EventPayload::GovernanceVote(GovernanceVoteData {
                    proposal_id: format!("prop-{}", proposal),
                    voter: format!("0x{:040x}", rng.r#gen::<u128>()),
                    support: rng.gen_bool(0.6),
                    weight: rng.gen_range(1.0..500.0_f64).round(),
                }),
            )
        }
    }
}

/// Publish a random event every `interval` until the handle is aborted
pub fn spawn_producer(service: Arc<EventGridService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let event = random_event();
            debug!(topic = %event.topic, event_type = %event.event_type, "Simulated event");
            service.process_event(event);
        }
    })
}
