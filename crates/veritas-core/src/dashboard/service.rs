//! Data source for dashboard sections

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;

use super::types::{
    AssetPerformance, DashboardOverview, DashboardPerformance, ModelResults, ModelSummary,
    PerformancePoint, PortfolioValue, ProposalSummary, RiskScore, StrategySummary, VotingOverview,
};
use super::DashboardError;

/// Backend used by [`DashboardState`](super::DashboardState) to load sections.
///
/// Implementations must be cheap to call concurrently; the state container
/// issues overlapping requests without de-duplication.
#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn fetch_overview(&self) -> Result<DashboardOverview, DashboardError>;

    async fn fetch_performance(&self) -> Result<DashboardPerformance, DashboardError>;

    async fn fetch_model_results(&self) -> Result<ModelResults, DashboardError>;

    async fn fetch_voting_overview(&self) -> Result<VotingOverview, DashboardError>;
}

/// Deterministic sample data, used when API mocking is enabled.
#[derive(Debug, Clone, Default)]
pub struct MockDashboardService {
    latency: Option<Duration>,
}

impl MockDashboardService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    pub fn sample_overview() -> DashboardOverview {
        let now = Utc::now();
        DashboardOverview {
            portfolio_value: PortfolioValue {
                current: 1_245_678.9,
                percentage_change: 3.2,
                last_updated: now,
            },
            risk_score: RiskScore {
                level: 42.0,
                status: "moderate".to_string(),
                description: "Portfolio risk within tolerance; ETH concentration elevated"
                    .to_string(),
            },
            active_strategies: vec![
                StrategySummary {
                    id: "strat-1".to_string(),
                    name: "Stablecoin Yield Optimizer".to_string(),
                    status: "active".to_string(),
                    performance: 5.4,
                },
                StrategySummary {
                    id: "strat-2".to_string(),
                    name: "ETH-USDC Concentrated Liquidity".to_string(),
                    status: "active".to_string(),
                    performance: 12.1,
                },
                StrategySummary {
                    id: "strat-3".to_string(),
                    name: "Cross-Chain Arbitrage".to_string(),
                    status: "paused".to_string(),
                    performance: -1.8,
                },
            ],
            last_updated: now,
        }
    }

    pub fn sample_performance() -> DashboardPerformance {
        let now = Utc::now();
        let today = now.date_naive();
        let historical_performance = (0..30)
            .rev()
            .map(|days_ago| PerformancePoint {
                date: today - ChronoDuration::days(days_ago),
                value: 1_000_000.0 + (30 - days_ago) as f64 * 8_250.0,
            })
            .collect();

        let asset = |id: &str, name: &str, symbol: &str, change: f64| AssetPerformance {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            change,
        };

        DashboardPerformance {
            top_performers: vec![
                asset("eth", "Ethereum", "ETH", 8.7),
                asset("arb", "Arbitrum", "ARB", 6.1),
                asset("link", "Chainlink", "LINK", 4.3),
            ],
            underperformers: vec![
                asset("op", "Optimism", "OP", -3.9),
                asset("uni", "Uniswap", "UNI", -2.2),
            ],
            historical_performance,
            last_updated: now,
        }
    }

    pub fn sample_model_results() -> ModelResults {
        let now = Utc::now();
        ModelResults {
            models: vec![
                ModelSummary {
                    id: "model-1".to_string(),
                    name: "Black-Litterman Allocation".to_string(),
                    status: "completed".to_string(),
                    accuracy: 0.87,
                    last_run: now - ChronoDuration::hours(2),
                },
                ModelSummary {
                    id: "model-2".to_string(),
                    name: "Liquidity Risk Forecast".to_string(),
                    status: "running".to_string(),
                    accuracy: 0.81,
                    last_run: now - ChronoDuration::minutes(15),
                },
            ],
            last_updated: now,
        }
    }

    pub fn sample_voting_overview() -> VotingOverview {
        let now = Utc::now();
        VotingOverview {
            active_proposals: 2,
            total_votes_cast: 18_432,
            participation_rate: 0.37,
            proposals: vec![
                ProposalSummary {
                    id: "prop-12".to_string(),
                    title: "Raise stablecoin pool allocation cap to 45%".to_string(),
                    status: "active".to_string(),
                    votes_for: 9_120,
                    votes_against: 2_310,
                    ends_at: now + ChronoDuration::days(3),
                },
                ProposalSummary {
                    id: "prop-13".to_string(),
                    title: "Onboard Base network liquidity pools".to_string(),
                    status: "active".to_string(),
                    votes_for: 5_004,
                    votes_against: 1_998,
                    ends_at: now + ChronoDuration::days(6),
                },
            ],
            last_updated: now,
        }
    }
}

#[async_trait]
impl DashboardService for MockDashboardService {
    async fn fetch_overview(&self) -> Result<DashboardOverview, DashboardError> {
        self.simulate_latency().await;
        Ok(Self::sample_overview())
    }

    async fn fetch_performance(&self) -> Result<DashboardPerformance, DashboardError> {
        self.simulate_latency().await;
        Ok(Self::sample_performance())
    }

    async fn fetch_model_results(&self) -> Result<ModelResults, DashboardError> {
        self.simulate_latency().await;
        Ok(Self::sample_model_results())
    }

    async fn fetch_voting_overview(&self) -> Result<VotingOverview, DashboardError> {
        self.simulate_latency().await;
        Ok(Self::sample_voting_overview())
    }
}
