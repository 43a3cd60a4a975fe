//! Messages pushed to WebSocket clients.
//!
//! Dashboard state changes, Event Grid deliveries and feed snapshots are
//! merged into one stream of [`StreamEvent`]s, each serialized as
//! `{"type": ..., "data": ...}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use veritas_core::{
    AllocationData, DashboardData, DashboardEvent, EventGridEvent, ModelCommand, ModelData,
    Section, VotingData,
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum StreamEvent {
    Connected {
        version: String,
        timestamp: DateTime<Utc>,
    },

    // -- Dashboard state --
    Dashboard(DashboardEvent),

    // -- Event Grid --
    GridEvent(EventGridEvent),

    // -- Feeds --
    VotingUpdate(VotingData),
    ModelUpdate(ModelData),
    AllocationUpdate(AllocationData),
    SystemUpdate(DashboardData),

    // -- Client command outcome --
    CommandRejected {
        action: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    // -- System --
    Heartbeat {
        uptime_secs: u64,
        simulated_feeds: usize,
        event_grid_subscriptions: usize,
        timestamp: DateTime<Utc>,
    },
}

impl StreamEvent {
    /// Serialize to JSON string for WebSocket transmission.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Commands a WebSocket client may send as text frames
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientCommand {
    #[serde(rename_all = "camelCase")]
    Refresh { section: Option<Section> },
    #[serde(rename_all = "camelCase")]
    SetTab { tab: String },
    #[serde(rename_all = "camelCase")]
    SubmitVote {
        proposal_id: String,
        support: bool,
        #[serde(default = "default_vote_weight")]
        weight: f64,
    },
    #[serde(rename_all = "camelCase")]
    SendCommand { command: ModelCommand },
    #[serde(rename_all = "camelCase")]
    UpdateAllocations { weights: BTreeMap<String, f64> },
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::Refresh { .. } => "refresh",
            ClientCommand::SetTab { .. } => "setTab",
            ClientCommand::SubmitVote { .. } => "submitVote",
            ClientCommand::SendCommand { .. } => "sendCommand",
            ClientCommand::UpdateAllocations { .. } => "updateAllocations",
        }
    }
}

pub(crate) fn default_vote_weight() -> f64 {
    1.0
}
