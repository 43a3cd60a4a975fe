//! Feed payloads
//!
//! Every payload flattens a [`FeedBase`] (`status`, `timestamp`) and adds
//! its domain fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Active,
    Running,
    Paused,
    Completed,
    Degraded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedBase {
    pub status: FeedStatus,
    pub timestamp: DateTime<Utc>,
}

impl FeedBase {
    pub fn now(status: FeedStatus) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// VOTING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub title: String,
    /// "active" or "closed"
    pub status: String,
    pub votes_for: f64,
    pub votes_against: f64,
    pub ends_at: DateTime<Utc>,
}

impl Proposal {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingData {
    #[serde(flatten)]
    pub base: FeedBase,
    pub proposals: Vec<Proposal>,
    pub total_voting_power: f64,
    /// Proposal id -> support, for votes cast from this session
    #[serde(default)]
    pub user_votes: HashMap<String, bool>,
}

// ============================================================================
// MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelData {
    #[serde(flatten)]
    pub base: FeedBase,
    pub model_id: String,
    pub run_id: String,
    /// 0 - 100
    pub progress: f64,
    pub stage: String,
    pub metrics: ModelMetrics,
    #[serde(default)]
    pub last_command: Option<String>,
}

// ============================================================================
// ALLOCATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationData {
    #[serde(flatten)]
    pub base: FeedBase,
    /// Asset symbol -> current weight; weights sum to 1.0
    pub weights: BTreeMap<String, f64>,
    /// Asset symbol -> target weight
    pub target_weights: BTreeMap<String, f64>,
    pub total_value: f64,
    pub rebalance_needed: bool,
}

// ============================================================================
// DASHBOARD / SYSTEM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    /// Percent
    pub cpu: f64,
    /// Percent
    pub memory: f64,
    pub latency_ms: f64,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    #[serde(flatten)]
    pub base: FeedBase,
    pub system_health: SystemHealth,
    pub active_users: u32,
    pub open_alerts: u32,
}
