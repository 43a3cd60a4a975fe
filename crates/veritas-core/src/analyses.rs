//! AI analyses list with a deterministic fallback
//!
//! The analyses page should never be empty: when the caller is not
//! authenticated or the backing source fails, a fixed set of sample
//! analyses is returned instead and the result is flagged.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sanitize::sanitize_message;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub model: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysesResult {
    pub analyses: Vec<AiAnalysis>,
    /// True when the list is the built-in fallback
    pub used_fallback: bool,
}

/// Backend holding a user's analyses
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    async fn fetch_analyses(&self, session: &Session) -> Result<Vec<AiAnalysis>, String>;
}

/// Load the caller's analyses, substituting [`fallback_analyses`] when there
/// is no session or the source errors.
pub async fn load_analyses(
    session: Option<&Session>,
    source: &dyn AnalysisSource,
) -> AnalysesResult {
    let Some(session) = session else {
        return AnalysesResult {
            analyses: fallback_analyses(),
            used_fallback: true,
        };
    };

    match source.fetch_analyses(session).await {
        Ok(analyses) => AnalysesResult {
            analyses,
            used_fallback: false,
        },
        Err(e) => {
            warn!(
                user_id = %session.user_id,
                error = %sanitize_message(&e),
                "Failed to load analyses, using fallback"
            );
            AnalysesResult {
                analyses: fallback_analyses(),
                used_fallback: true,
            }
        }
    }
}

/// Fixed sample analyses with ids "1", "2", "3"
pub fn fallback_analyses() -> Vec<AiAnalysis> {
    let now = Utc::now();
    let analysis = |id: &str, title: &str, summary: &str, model: &str, confidence: f64, days: i64| {
        AiAnalysis {
            id: id.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            model: model.to_string(),
            confidence,
            created_at: now - Duration::days(days),
        }
    };

    vec![
        analysis(
            "1",
            "Portfolio Risk Assessment",
            "Concentration in ETH-denominated pools raises drawdown risk; diversification into stablecoin strategies recommended.",
            "risk-model-v2",
            0.87,
            1,
        ),
        analysis(
            "2",
            "Market Trend Analysis",
            "Liquidity is rotating toward L2 venues; fee APRs on Base and Arbitrum pools outpace mainnet.",
            "trend-analyzer",
            0.78,
            3,
        ),
        analysis(
            "3",
            "Yield Optimization Report",
            "Rebalancing 10% from idle USDC into the concentrated ETH-USDC range improves projected yield by 1.8%.",
            "black-litterman",
            0.82,
            7,
        ),
    ]
}

/// Source returning no analyses, used when no backend is configured
#[derive(Debug, Clone, Default)]
pub struct EmptyAnalysisSource;

#[async_trait]
impl AnalysisSource for EmptyAnalysisSource {
    async fn fetch_analyses(&self, _session: &Session) -> Result<Vec<AiAnalysis>, String> {
        Ok(Vec::new())
    }
}
