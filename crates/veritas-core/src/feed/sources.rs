//! Domain feed sources and their actions.
//!
//! Simulated updates are random walks seeded from a fixed initial snapshot.
//! Actions apply the change to the local snapshot immediately and, when the
//! feed is live, forward it to the endpoint as JSON.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::info;
use uuid::Uuid;

use super::payloads::{
    AllocationData, DashboardData, FeedBase, FeedStatus, ModelData, ModelMetrics, Proposal,
    SystemHealth, VotingData,
};
use super::{Feed, FeedError, FeedSource};

// ============================================================================
// VOTING
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct VotingFeed;

#[async_trait]
impl FeedSource for VotingFeed {
    type Data = VotingData;

    fn domain(&self) -> &'static str {
        "voting"
    }

    async fn initial_data(&self) -> Result<VotingData, FeedError> {
        let now = Utc::now();
        let proposal = |id: &str, title: &str, votes_for: f64, votes_against: f64, days: i64| Proposal {
            id: id.to_string(),
            title: title.to_string(),
            status: "active".to_string(),
            votes_for,
            votes_against,
            ends_at: now + ChronoDuration::days(days),
        };

        Ok(VotingData {
            base: FeedBase::now(FeedStatus::Active),
            proposals: vec![
                proposal("prop-12", "Raise stablecoin pool allocation cap to 45%", 9_120.0, 2_310.0, 3),
                proposal("prop-13", "Onboard Base network liquidity pools", 5_004.0, 1_998.0, 6),
                proposal("prop-14", "Reduce rebalancing threshold to 3%", 1_250.0, 1_730.0, 9),
            ],
            total_voting_power: 50_000.0,
            user_votes: HashMap::new(),
        })
    }

    fn next_update(&self, prev: &VotingData) -> VotingData {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let mut next = prev.clone();

        for proposal in next.proposals.iter_mut().filter(|p| p.is_active()) {
            if proposal.ends_at <= now {
                proposal.status = "closed".to_string();
                continue;
            }
            proposal.votes_for += rng.gen_range(0.0..50.0_f64).round();
            proposal.votes_against += rng.gen_range(0.0..30.0_f64).round();
        }

        next.base = FeedBase::now(if next.proposals.iter().any(Proposal::is_active) {
            FeedStatus::Active
        } else {
            FeedStatus::Completed
        });
        next
    }
}

impl Feed<VotingFeed> {
    /// Cast a vote on an active proposal. `weight` must be finite and positive.
    pub fn submit_vote(&self, proposal_id: &str, support: bool, weight: f64) -> Result<(), FeedError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(FeedError::InvalidVote(format!("weight must be positive, got {}", weight)));
        }

        let mut outcome = Err(FeedError::NoData);
        self.update(|data| {
            outcome = match data.proposals.iter_mut().find(|p| p.id == proposal_id) {
                None => Err(FeedError::UnknownProposal(proposal_id.to_string())),
                Some(p) if !p.is_active() => Err(FeedError::ProposalClosed(proposal_id.to_string())),
                Some(p) => {
                    if support {
                        p.votes_for += weight;
                    } else {
                        p.votes_against += weight;
                    }
                    data.user_votes.insert(proposal_id.to_string(), support);
                    data.base.timestamp = Utc::now();
                    Ok(())
                }
            };
        });
        outcome?;

        info!(proposal_id, support, weight, "Vote submitted");
        self.send_outbound(
            serde_json::json!({
                "type": "vote",
                "proposalId": proposal_id,
                "support": support,
                "weight": weight,
            })
            .to_string(),
        );
        Ok(())
    }
}

// ============================================================================
// MODEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCommand {
    Start,
    Pause,
    Resume,
    Cancel,
}

impl ModelCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelCommand::Start => "start",
            ModelCommand::Pause => "pause",
            ModelCommand::Resume => "resume",
            ModelCommand::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelFeed {
    model_id: String,
}

impl Default for ModelFeed {
    fn default() -> Self {
        Self::new("black-litterman")
    }
}

impl ModelFeed {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

fn stage_for(progress: f64) -> &'static str {
    match progress {
        p if p >= 100.0 => "complete",
        p if p >= 75.0 => "validation",
        p if p >= 40.0 => "optimization",
        p if p >= 10.0 => "feature-engineering",
        _ => "data-loading",
    }
}

#[async_trait]
impl FeedSource for ModelFeed {
    type Data = ModelData;

    fn domain(&self) -> &'static str {
        "model"
    }

    async fn initial_data(&self) -> Result<ModelData, FeedError> {
        Ok(ModelData {
            base: FeedBase::now(FeedStatus::Running),
            model_id: self.model_id.clone(),
            run_id: Uuid::new_v4().to_string(),
            progress: 0.0,
            stage: stage_for(0.0).to_string(),
            metrics: ModelMetrics {
                accuracy: 0.5,
                loss: 1.0,
            },
            last_command: None,
        })
    }

    fn next_update(&self, prev: &ModelData) -> ModelData {
        let mut next = prev.clone();
        if prev.base.status != FeedStatus::Running {
            next.base.timestamp = Utc::now();
            return next;
        }

        let mut rng = rand::thread_rng();
        next.progress = (prev.progress + rng.gen_range(5.0..15.0)).min(100.0);
        next.stage = stage_for(next.progress).to_string();
        // Converge toward ~0.9 accuracy as training advances
        let gain = rng.gen_range(0.0..0.04);
        next.metrics.accuracy = (prev.metrics.accuracy + gain * (0.92 - prev.metrics.accuracy) * 4.0)
            .clamp(0.0, 0.99);
        next.metrics.loss = (prev.metrics.loss * rng.gen_range(0.85..0.98)).max(0.01);
        next.base = FeedBase::now(if next.progress >= 100.0 {
            FeedStatus::Completed
        } else {
            FeedStatus::Running
        });
        next
    }
}

impl Feed<ModelFeed> {
    /// Apply a run-control command
    pub fn send_command(&self, command: ModelCommand) -> Result<(), FeedError> {
        let model_id = self.source().model_id.clone();
        let applied = self.update(|data| {
            match command {
                ModelCommand::Start => {
                    data.run_id = Uuid::new_v4().to_string();
                    data.progress = 0.0;
                    data.stage = stage_for(0.0).to_string();
                    data.base.status = FeedStatus::Running;
                }
                ModelCommand::Pause if data.base.status == FeedStatus::Running => {
                    data.base.status = FeedStatus::Paused;
                }
                ModelCommand::Resume if data.base.status == FeedStatus::Paused => {
                    data.base.status = FeedStatus::Running;
                }
                ModelCommand::Cancel if data.base.status != FeedStatus::Completed => {
                    data.base.status = FeedStatus::Error;
                    data.stage = "cancelled".to_string();
                }
                _ => {}
            }
            data.last_command = Some(command.as_str().to_string());
            data.base.timestamp = Utc::now();
        });
        if !applied {
            return Err(FeedError::NoData);
        }

        info!(model_id = %model_id, command = command.as_str(), "Model command sent");
        self.send_outbound(
            serde_json::json!({
                "type": "command",
                "modelId": model_id,
                "command": command,
            })
            .to_string(),
        );
        Ok(())
    }
}

// ============================================================================
// ALLOCATION
// ============================================================================

/// Drift from target beyond which a rebalance is flagged
const REBALANCE_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Default)]
pub struct AllocationFeed;

fn normalize(weights: &BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>, FeedError> {
    if weights.is_empty() {
        return Err(FeedError::InvalidAllocation("no assets".to_string()));
    }
    if let Some((asset, w)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
        return Err(FeedError::InvalidAllocation(format!(
            "weight for {} must be a non-negative number, got {}",
            asset, w
        )));
    }
    let total: f64 = weights.values().sum();
    if total <= 0.0 {
        return Err(FeedError::InvalidAllocation("weights sum to zero".to_string()));
    }
    Ok(weights
        .iter()
        .map(|(asset, w)| (asset.clone(), w / total))
        .collect())
}

fn needs_rebalance(weights: &BTreeMap<String, f64>, targets: &BTreeMap<String, f64>) -> bool {
    weights.iter().any(|(asset, w)| {
        let target = targets.get(asset).copied().unwrap_or(0.0);
        (w - target).abs() > REBALANCE_THRESHOLD
    })
}

#[async_trait]
impl FeedSource for AllocationFeed {
    type Data = AllocationData;

    fn domain(&self) -> &'static str {
        "allocation"
    }

    async fn initial_data(&self) -> Result<AllocationData, FeedError> {
        let weights: BTreeMap<String, f64> = [("ETH", 0.35), ("BTC", 0.25), ("USDC", 0.30), ("LINK", 0.10)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        Ok(AllocationData {
            base: FeedBase::now(FeedStatus::Active),
            target_weights: weights.clone(),
            weights,
            total_value: 1_245_678.9,
            rebalance_needed: false,
        })
    }

    fn next_update(&self, prev: &AllocationData) -> AllocationData {
        let mut rng = rand::thread_rng();
        let drifted: BTreeMap<String, f64> = prev
            .weights
            .iter()
            .map(|(asset, w)| (asset.clone(), (w * (1.0 + rng.gen_range(-0.02..0.02))).max(0.0)))
            .collect();

        let mut next = prev.clone();
        if let Ok(weights) = normalize(&drifted) {
            next.weights = weights;
        }
        next.total_value = (prev.total_value * (1.0 + rng.gen_range(-0.005..0.006))).max(0.0);
        next.rebalance_needed = needs_rebalance(&next.weights, &next.target_weights);
        next.base = FeedBase::now(FeedStatus::Active);
        next
    }
}

impl Feed<AllocationFeed> {
    /// Set new target weights (normalized to sum to 1.0) and move the
    /// current allocation onto them.
    pub fn update_allocations(&self, weights: BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>, FeedError> {
        let normalized = normalize(&weights)?;
        let applied = self.update(|data| {
            data.weights = normalized.clone();
            data.target_weights = normalized.clone();
            data.rebalance_needed = false;
            data.base.timestamp = Utc::now();
        });
        if !applied {
            return Err(FeedError::NoData);
        }

        info!(assets = normalized.len(), "Allocations updated");
        self.send_outbound(
            serde_json::json!({
                "type": "allocations",
                "weights": normalized,
            })
            .to_string(),
        );
        Ok(normalized)
    }
}

// ============================================================================
// SYSTEM
// ============================================================================

#[derive(Debug, Clone)]
pub struct SystemFeed {
    tick_secs: u64,
}

impl Default for SystemFeed {
    fn default() -> Self {
        Self { tick_secs: 10 }
    }
}

impl SystemFeed {
    /// `tick_secs` is added to the reported uptime on every update
    pub fn new(tick_secs: u64) -> Self {
        Self { tick_secs }
    }
}

#[async_trait]
impl FeedSource for SystemFeed {
    type Data = DashboardData;

    fn domain(&self) -> &'static str {
        "dashboard"
    }

    async fn initial_data(&self) -> Result<DashboardData, FeedError> {
        Ok(DashboardData {
            base: FeedBase::now(FeedStatus::Active),
            system_health: SystemHealth {
                cpu: 23.0,
                memory: 41.0,
                latency_ms: 120.0,
                uptime_secs: 0,
            },
            active_users: 12,
            open_alerts: 0,
        })
    }

    fn next_update(&self, prev: &DashboardData) -> DashboardData {
        let mut rng = rand::thread_rng();
        let mut next = prev.clone();
        let health = &mut next.system_health;

        health.cpu = (health.cpu + rng.gen_range(-8.0..8.0)).clamp(1.0, 100.0);
        health.memory = (health.memory + rng.gen_range(-3.0..3.0)).clamp(1.0, 100.0);
        health.latency_ms = (health.latency_ms + rng.gen_range(-40.0..40.0)).clamp(5.0, 2_000.0);
        health.uptime_secs += self.tick_secs;

        let users = i64::from(prev.active_users) + rng.gen_range(-2..=3);
        next.active_users = users.max(0) as u32;

        let degraded = health.cpu > 90.0 || health.latency_ms > 500.0;
        next.open_alerts = if degraded { prev.open_alerts + 1 } else { 0 };
        next.base = FeedBase::now(if degraded {
            FeedStatus::Degraded
        } else {
            FeedStatus::Active
        });
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedConfig;
    use std::time::Duration;

    #[tokio::test]
    async fn test_voting_update_keeps_totals_monotonic() {
        let source = VotingFeed;
        let initial = source.initial_data().await.unwrap();
        let next = source.next_update(&initial);

        for (before, after) in initial.proposals.iter().zip(&next.proposals) {
            assert!(after.votes_for >= before.votes_for);
            assert!(after.votes_against >= before.votes_against);
        }
    }

    #[tokio::test]
    async fn test_expired_proposal_closes() {
        let source = VotingFeed;
        let mut data = source.initial_data().await.unwrap();
        data.proposals[0].ends_at = Utc::now() - ChronoDuration::minutes(1);

        let next = source.next_update(&data);
        assert_eq!(next.proposals[0].status, "closed");
        assert_eq!(next.proposals[0].votes_for, data.proposals[0].votes_for);
    }

    #[tokio::test]
    async fn test_model_run_completes() {
        let source = ModelFeed::default();
        let mut data = source.initial_data().await.unwrap();
        for _ in 0..30 {
            data = source.next_update(&data);
        }

        assert_eq!(data.progress, 100.0);
        assert_eq!(data.base.status, FeedStatus::Completed);
        assert_eq!(data.stage, "complete");
        assert!(data.metrics.loss < 1.0);
    }

    #[tokio::test]
    async fn test_paused_model_does_not_progress() {
        let source = ModelFeed::default();
        let mut data = source.initial_data().await.unwrap();
        data.base.status = FeedStatus::Paused;

        assert_eq!(source.next_update(&data).progress, data.progress);
    }

    #[tokio::test]
    async fn test_allocation_weights_stay_normalized() {
        let source = AllocationFeed;
        let mut data = source.initial_data().await.unwrap();
        for _ in 0..20 {
            data = source.next_update(&data);
            let total: f64 = data.weights.values().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_rejects_bad_weights() {
        assert!(normalize(&BTreeMap::new()).is_err());

        let negative: BTreeMap<String, f64> = [("ETH".to_string(), -1.0)].into_iter().collect();
        assert!(matches!(normalize(&negative), Err(FeedError::InvalidAllocation(_))));

        let zero: BTreeMap<String, f64> = [("ETH".to_string(), 0.0)].into_iter().collect();
        assert!(normalize(&zero).is_err());

        let ok: BTreeMap<String, f64> =
            [("ETH".to_string(), 3.0), ("USDC".to_string(), 1.0)].into_iter().collect();
        let normalized = normalize(&ok).unwrap();
        assert_eq!(normalized["ETH"], 0.75);
    }

    #[tokio::test]
    async fn test_system_feed_uptime_advances() {
        let source = SystemFeed::new(10);
        let data = source.initial_data().await.unwrap();
        let next = source.next_update(&data);

        assert_eq!(next.system_health.uptime_secs, 10);
        assert!((1.0..=100.0).contains(&next.system_health.cpu));
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_on_running_feeds() {
        let config = FeedConfig::simulated(Duration::from_secs(60));

        let voting = Feed::spawn(VotingFeed, config.clone());
        voting.watch().wait_for(|d| d.is_some()).await.unwrap();
        voting.submit_vote("prop-13", true, 250.0).unwrap();
        let data = voting.data().unwrap();
        assert_eq!(data.user_votes.get("prop-13"), Some(&true));
        assert_eq!(data.proposals[1].votes_for, 5_254.0);
        assert!(matches!(
            voting.submit_vote("prop-99", false, 1.0),
            Err(FeedError::UnknownProposal(_))
        ));

        let model = Feed::spawn(ModelFeed::default(), config.clone());
        model.watch().wait_for(|d| d.is_some()).await.unwrap();
        model.send_command(ModelCommand::Pause).unwrap();
        let data = model.data().unwrap();
        assert_eq!(data.base.status, FeedStatus::Paused);
        assert_eq!(data.last_command.as_deref(), Some("pause"));

        let allocation = Feed::spawn(AllocationFeed, config);
        allocation.watch().wait_for(|d| d.is_some()).await.unwrap();
        let weights: BTreeMap<String, f64> =
            [("ETH".to_string(), 1.0), ("USDC".to_string(), 1.0)].into_iter().collect();
        let applied = allocation.update_allocations(weights).unwrap();
        assert_eq!(applied["ETH"], 0.5);
        assert!(!allocation.data().unwrap().rebalance_needed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vote_weight_must_be_positive() {
        let voting = Feed::spawn(VotingFeed, FeedConfig::simulated(Duration::from_secs(60)));
        voting.watch().wait_for(|d| d.is_some()).await.unwrap();
        let before = voting.data().unwrap();

        for weight in [-1_000_000.0, 0.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                voting.submit_vote("prop-14", true, weight),
                Err(FeedError::InvalidVote(_))
            ));
        }

        let after = voting.data().unwrap();
        assert_eq!(after.proposals[2].votes_for, before.proposals[2].votes_for);
        assert!(after.user_votes.is_empty());
    }
}
