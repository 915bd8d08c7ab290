//! Score computation.
//!
//! Every contribution function takes the raw factor value and sanitizes it
//! before transforming, so [`ScoringEngine::score`] is total over any
//! [`WalletFactors`], including negative or NaN fields.

use ccs_core::error::ConfigError;
use ccs_core::types::{Score, WalletFactors};
use serde::Serialize;
use tracing::debug;

use crate::curves::{
    self, BALANCE_USD_REFERENCE, DEBT_EXPONENT, REPAYMENT_RANGE, STAKING_ETH_REFERENCE,
    TX_FREQUENCY_RANGE,
};
use crate::weights::WeightTable;

/// Points for a wallet with no liquidations.
pub const CLEAN_RECORD_POINTS: f64 = 25.0;
/// Points for one or two liquidations.
pub const MINOR_DEFAULT_POINTS: f64 = 15.0;
/// Points deducted per liquidation beyond two.
pub const DEFAULT_PENALTY: f64 = 5.0;

// --- per-factor contributions ---

pub fn repayment_points(rate: f64, weight: u32) -> f64 {
    let (lo, hi) = REPAYMENT_RANGE;
    f64::from(weight) * curves::normalize_01(curves::sanitize(rate), lo, hi)
}

/// Weight-independent schedule: 0 → 25, 1..=2 → 15, else `max(0, 25 - 5n)`.
pub fn default_points(count: u64) -> f64 {
    match count {
        0 => CLEAN_RECORD_POINTS,
        1 | 2 => MINOR_DEFAULT_POINTS,
        n => (CLEAN_RECORD_POINTS - n as f64 * DEFAULT_PENALTY).max(0.0),
    }
}

pub fn frequency_points(per_day: f64, weight: u32) -> f64 {
    let (lo, hi) = TX_FREQUENCY_RANGE;
    f64::from(weight) * curves::normalize_01(curves::sanitize(per_day), lo, hi)
}

pub fn balance_points(usd: f64, weight: u32) -> f64 {
    f64::from(weight) * curves::log_norm(usd, BALANCE_USD_REFERENCE)
}

pub fn stablecoin_points(ratio: f64, weight: u32) -> f64 {
    f64::from(weight) * curves::stablecoin_curve(ratio)
}

/// Rewards low utilization: `weight * (1 - u^1.5)`.
pub fn debt_points(utilization: f64, weight: u32) -> f64 {
    f64::from(weight) * (1.0 - curves::clamp01(utilization).powf(DEBT_EXPONENT))
}

pub fn staking_points(eth: f64, weight: u32) -> f64 {
    f64::from(weight) * curves::log_norm(eth, STAKING_ETH_REFERENCE)
}

// --- breakdown ---

/// Per-factor contributions before clamping and rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub repayment: f64,
    pub defaults: f64,
    pub frequency: f64,
    pub balance: f64,
    pub stablecoin: f64,
    pub debt: f64,
    pub staking: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.repayment
            + self.defaults
            + self.frequency
            + self.balance
            + self.stablecoin
            + self.debt
            + self.staking
    }

    /// Clamp the total to `[0, 100]` and round half away from zero.
    pub fn score(&self) -> Score {
        let total = self.total();
        if total.is_nan() {
            return Score::MIN;
        }
        let bounded = total.clamp(0.0, f64::from(Score::MAX.value()));
        Score::saturating(bounded.round() as u8)
    }
}

// --- engine ---

/// Scores wallets against a validated [`WeightTable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    weights: WeightTable,
}

impl ScoringEngine {
    pub fn new(weights: WeightTable) -> Result<Self, ConfigError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn breakdown(&self, factors: &WalletFactors) -> ScoreBreakdown {
        let w = &self.weights;
        ScoreBreakdown {
            repayment: repayment_points(factors.on_time_repayment_rate, w.on_time_repayment_rate),
            defaults: default_points(factors.default_count),
            frequency: frequency_points(factors.avg_tx_frequency, w.avg_tx_frequency),
            balance: balance_points(factors.avg_balance_usd, w.avg_balance_usd),
            stablecoin: stablecoin_points(factors.stablecoin_ratio, w.stablecoin_ratio),
            debt: debt_points(factors.debt_utilization, w.debt_utilization),
            staking: staking_points(factors.staking_amount_eth, w.staking_amount_eth),
        }
    }

    pub fn score(&self, factors: &WalletFactors) -> Score {
        let breakdown = self.breakdown(factors);
        let score = breakdown.score();
        debug!(total = breakdown.total(), score = score.value(), "scored factors");
        score
    }
}
