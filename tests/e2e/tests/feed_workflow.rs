//! Feed workflow tests: simulated progression, user actions against running
//! feeds, reconnect and fallback from an unreachable live endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use veritas_core::{
    AllocationFeed, Feed, FeedConfig, FeedError, FeedStatus, ModelCommand, ModelFeed,
    SystemFeed, VotingFeed,
};

fn simulated() -> FeedConfig {
    FeedConfig::simulated(Duration::from_millis(100))
}

#[tokio::test(start_paused = true)]
async fn test_voting_feed_accepts_votes_while_simulating() {
    let feed = Feed::spawn(VotingFeed, simulated());
    let mut rx = feed.watch();
    rx.wait_for(|v| v.is_some()).await.unwrap();

    let before = feed.data().unwrap();
    let prop = before.proposals.iter().find(|p| p.id == "prop-14").unwrap().clone();

    feed.submit_vote("prop-14", false, 500.0).unwrap();

    let after = feed.data().unwrap();
    let voted = after.proposals.iter().find(|p| p.id == "prop-14").unwrap();
    assert_eq!(voted.votes_against, prop.votes_against + 500.0);
    assert_eq!(voted.votes_for, prop.votes_for);
    assert_eq!(after.user_votes.get("prop-14"), Some(&false));

    assert!(matches!(
        feed.submit_vote("prop-99", true, 1.0),
        Err(FeedError::UnknownProposal(_))
    ));

    // Simulation continues from the voted state
    tokio::time::sleep(Duration::from_millis(350)).await;
    let later = feed.data().unwrap();
    let still = later.proposals.iter().find(|p| p.id == "prop-14").unwrap();
    assert!(still.votes_against >= voted.votes_against);
    assert!(feed.is_simulated());
}

#[tokio::test(start_paused = true)]
async fn test_model_run_lifecycle() {
    let feed = Feed::spawn(ModelFeed::default(), simulated());
    let mut rx = feed.watch();
    rx.wait_for(|v| v.is_some()).await.unwrap();

    feed.send_command(ModelCommand::Start).unwrap();
    let run_id = feed.data().unwrap().run_id;
    rx.wait_for(|v| v.as_ref().is_some_and(|m| m.progress > 0.0))
        .await
        .unwrap();

    feed.send_command(ModelCommand::Pause).unwrap();
    let paused = feed.data().unwrap();
    assert_eq!(paused.base.status, FeedStatus::Paused);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(feed.data().unwrap().progress, paused.progress);

    feed.send_command(ModelCommand::Resume).unwrap();
    let done = rx
        .wait_for(|v| v.as_ref().is_some_and(|m| m.base.status == FeedStatus::Completed))
        .await
        .unwrap()
        .clone()
        .unwrap();
    assert_eq!(done.progress, 100.0);
    assert_eq!(done.stage, "complete");
    assert_eq!(done.run_id, run_id);
    assert_eq!(done.last_command.as_deref(), Some("resume"));
}

#[tokio::test(start_paused = true)]
async fn test_allocation_update_normalizes_and_clears_rebalance() {
    let feed = Feed::spawn(AllocationFeed, simulated());
    let mut rx = feed.watch();
    rx.wait_for(|v| v.is_some()).await.unwrap();

    let weights = BTreeMap::from([
        ("ETH".to_string(), 2.0),
        ("BTC".to_string(), 1.0),
        ("USDC".to_string(), 1.0),
    ]);
    let normalized = feed.update_allocations(weights).unwrap();
    assert_eq!(normalized["ETH"], 0.5);
    assert_eq!(normalized["BTC"], 0.25);

    let data = feed.data().unwrap();
    assert_eq!(data.target_weights, normalized);
    assert!(!data.rebalance_needed);
    assert!(!data.weights.contains_key("LINK"));

    let rejected = feed.update_allocations(BTreeMap::from([("ETH".to_string(), -1.0)]));
    assert!(matches!(rejected, Err(FeedError::InvalidAllocation(_))));
    assert_eq!(feed.data().unwrap().target_weights, normalized);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_resets_to_initial_state() {
    let feed = Feed::spawn(VotingFeed, simulated());
    let mut rx = feed.watch();
    rx.wait_for(|v| v.is_some()).await.unwrap();
    feed.submit_vote("prop-12", true, 1_000.0).unwrap();
    assert!(!feed.data().unwrap().user_votes.is_empty());

    feed.reconnect();
    let mut rx = feed.watch();
    let fresh = rx
        .wait_for(|v| v.is_some())
        .await
        .unwrap()
        .clone()
        .unwrap();
    assert!(fresh.user_votes.is_empty());
    assert!(feed.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_stopped_system_feed_keeps_last_snapshot() {
    let feed = Feed::spawn(SystemFeed::default(), simulated());
    let mut rx = feed.watch();
    rx.wait_for(|v| v.as_ref().is_some_and(|d| d.system_health.uptime_secs > 0))
        .await
        .unwrap();

    feed.stop();
    tokio::task::yield_now().await;
    let last = feed.data();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(!feed.is_running());
    assert_eq!(
        feed.data().map(|d| d.system_health.uptime_secs),
        last.map(|d| d.system_health.uptime_secs)
    );
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_endpoint_simulates_and_drops_outbound() {
    let config = FeedConfig {
        endpoint: Some("ws://127.0.0.1:9/feeds/voting".to_string()),
        update_interval: Duration::from_millis(100),
        connect_timeout: Duration::from_millis(200),
    };
    let feed = Feed::spawn(VotingFeed, config);
    let mut rx = feed.watch();
    rx.wait_for(|v| v.is_some()).await.unwrap();

    // Simulation takes over once the connection attempt fails
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(feed.is_simulated());
    feed.submit_vote("prop-13", true, 10.0).unwrap();
}
