//! Synthetic protocol history
//!
//! Stands in for the indexer's historical-data endpoint while API mocking is
//! enabled. Series are seeded by protocol name so repeated requests for the
//! same protocol see the same curve.

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    /// Total value locked (USD)
    pub tvl: f64,
    /// Daily volume (USD)
    pub volume: f64,
    /// Daily fees (USD)
    pub fees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSeries {
    pub protocol: String,
    pub days: u32,
    pub data: Vec<HistoricalPoint>,
}

/// Generate `days` daily points ending today, oldest first.
///
/// `days` is clamped to `1..=MAX_HISTORY_DAYS`.
pub fn generate_series(protocol: &str, days: u32) -> HistoricalSeries {
    let days = days.clamp(1, MAX_HISTORY_DAYS);
    let mut rng = StdRng::seed_from_u64(seed_for(protocol));
    let today = Utc::now().date_naive();

    let mut tvl: f64 = rng.gen_range(5_000_000.0..50_000_000.0);
    let fee_rate = rng.gen_range(0.0005..0.003);

    let data = (0..days)
        .map(|i| {
            tvl = (tvl * (1.0 + rng.gen_range(-0.04..0.045))).max(100_000.0);
            let volume = tvl * rng.gen_range(0.05..0.35);
            HistoricalPoint {
                date: today - Duration::days(i64::from(days - 1 - i)),
                tvl: round2(tvl),
                volume: round2(volume),
                fees: round2(volume * fee_rate),
            }
        })
        .collect();

    HistoricalSeries {
        protocol: protocol.to_string(),
        days,
        data,
    }
}

fn seed_for(protocol: &str) -> u64 {
    // FNV-1a; stable across runs and platforms
    protocol
        .to_ascii_lowercase()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
