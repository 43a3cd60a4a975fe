//! Dashboard section snapshots
//!
//! Every snapshot is produced by one fetch and replaced wholesale on the
//! next successful refresh.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dashboard section with its own data, loading flag and error slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Overview,
    Performance,
    Models,
    Voting,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Overview,
        Section::Performance,
        Section::Models,
        Section::Voting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Overview => "overview",
            Section::Performance => "performance",
            Section::Models => "models",
            Section::Voting => "voting",
        }
    }

    /// Fixed user-facing message stored when a refresh fails
    pub fn error_message(&self) -> &'static str {
        match self {
            Section::Overview => "Failed to load overview data",
            Section::Performance => "Failed to load performance data",
            Section::Models => "Failed to load model results",
            Section::Voting => "Failed to load voting data",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overview" => Ok(Section::Overview),
            "performance" => Ok(Section::Performance),
            "models" => Ok(Section::Models),
            "voting" => Ok(Section::Voting),
            other => Err(format!("Unknown dashboard section: {}", other)),
        }
    }
}

/// One value per [`Section`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionMap<T> {
    pub overview: T,
    pub performance: T,
    pub models: T,
    pub voting: T,
}

impl<T> SectionMap<T> {
    pub fn get(&self, section: Section) -> &T {
        match section {
            Section::Overview => &self.overview,
            Section::Performance => &self.performance,
            Section::Models => &self.models,
            Section::Voting => &self.voting,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut T {
        match section {
            Section::Overview => &mut self.overview,
            Section::Performance => &mut self.performance,
            Section::Models => &mut self.models,
            Section::Voting => &mut self.voting,
        }
    }
}

// ============================================================================
// OVERVIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValue {
    pub current: f64,
    pub percentage_change: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    /// Numeric risk level, 0-100
    pub level: f64,
    /// "low", "moderate", "high"
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySummary {
    pub id: String,
    pub name: String,
    pub status: String,
    /// Return since inception, percent
    pub performance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub portfolio_value: PortfolioValue,
    pub risk_score: RiskScore,
    pub active_strategies: Vec<StrategySummary>,
    pub last_updated: DateTime<Utc>,
}

// ============================================================================
// PERFORMANCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPerformance {
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Period return, percent
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPerformance {
    pub top_performers: Vec<AssetPerformance>,
    pub underperformers: Vec<AssetPerformance>,
    pub historical_performance: Vec<PerformancePoint>,
    pub last_updated: DateTime<Utc>,
}

// ============================================================================
// MODELS & VOTING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    pub accuracy: f64,
    pub last_run: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResults {
    pub models: Vec<ModelSummary>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub id: String,
    pub title: String,
    pub status: String,
    pub votes_for: u64,
    pub votes_against: u64,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingOverview {
    pub active_proposals: u32,
    pub total_votes_cast: u64,
    /// Share of eligible voting power that voted, 0.0 - 1.0
    pub participation_rate: f64,
    pub proposals: Vec<ProposalSummary>,
    pub last_updated: DateTime<Utc>,
}
