//! User-configurable dashboard settings
//!
//! Settings are always fully populated. Changes arrive as a
//! [`SettingsPatch`] and are merged key-wise: the two nested maps
//! (`visible_metrics`, `refresh_rates`) merge per key, everything else
//! replaces only when present.

use serde::{Deserialize, Serialize};

/// Persisted storage key for the settings JSON
pub const SETTINGS_KEY: &str = "dashboardSettings";

/// Colour scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Which headline metrics are shown on the overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibleMetrics {
    pub portfolio_value: bool,
    pub active_strategies: bool,
    pub risk_score: bool,
}

impl Default for VisibleMetrics {
    fn default() -> Self {
        Self {
            portfolio_value: true,
            active_strategies: true,
            risk_score: true,
        }
    }
}

/// Refresh cadence per widget, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshRates {
    pub portfolio_value: u32,
    pub risk_score: u32,
    pub performance: u32,
    pub model_results: u32,
    pub voting: u32,
}

impl Default for RefreshRates {
    fn default() -> Self {
        Self {
            portfolio_value: 30,
            risk_score: 60,
            performance: 300,
            model_results: 600,
            voting: 120,
        }
    }
}

/// Complete dashboard settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    pub visible_metrics: VisibleMetrics,
    pub refresh_rates: RefreshRates,
    pub theme: Theme,
    pub compact_view: bool,
}

/// Partial update of [`VisibleMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibleMetricsPatch {
    pub portfolio_value: Option<bool>,
    pub active_strategies: Option<bool>,
    pub risk_score: Option<bool>,
}

/// Partial update of [`RefreshRates`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshRatesPatch {
    pub portfolio_value: Option<u32>,
    pub risk_score: Option<u32>,
    pub performance: Option<u32>,
    pub model_results: Option<u32>,
    pub voting: Option<u32>,
}

/// Partial update of [`DashboardSettings`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub visible_metrics: Option<VisibleMetricsPatch>,
    pub refresh_rates: Option<RefreshRatesPatch>,
    pub theme: Option<Theme>,
    pub compact_view: Option<bool>,
}

impl DashboardSettings {
    /// Parse stored JSON. Keys missing from the stored document take their
    /// default values; unparseable documents yield `None`.
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// Return a copy with `patch` applied key-wise.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let mut next = self.clone();

        if let Some(vm) = &patch.visible_metrics {
            let target = &mut next.visible_metrics;
            if let Some(v) = vm.portfolio_value {
                target.portfolio_value = v;
            }
            if let Some(v) = vm.active_strategies {
                target.active_strategies = v;
            }
            if let Some(v) = vm.risk_score {
                target.risk_score = v;
            }
        }

        if let Some(rr) = &patch.refresh_rates {
            let target = &mut next.refresh_rates;
            if let Some(v) = rr.portfolio_value {
                target.portfolio_value = v;
            }
            if let Some(v) = rr.risk_score {
                target.risk_score = v;
            }
            if let Some(v) = rr.performance {
                target.performance = v;
            }
            if let Some(v) = rr.model_results {
                target.model_results = v;
            }
            if let Some(v) = rr.voting {
                target.voting = v;
            }
        }

        if let Some(theme) = patch.theme {
            next.theme = theme;
        }
        if let Some(compact) = patch.compact_view {
            next.compact_view = compact;
        }

        next
    }
}
