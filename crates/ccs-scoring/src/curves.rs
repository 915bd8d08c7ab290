//! Normalization curves mapping raw factor values onto `[0, 1]`-ish fractions.

/// Lower/upper bound of the repayment-rate ramp.
pub const REPAYMENT_RANGE: (f64, f64) = (0.5, 1.0);

/// Transactions per day at which the frequency factor saturates.
pub const TX_FREQUENCY_RANGE: (f64, f64) = (0.0, 4.0);

/// USD balance at which the log curve reaches 1.
pub const BALANCE_USD_REFERENCE: f64 = 4400.0;

/// Staked ETH at which the log curve reaches 1.
pub const STAKING_ETH_REFERENCE: f64 = 50.0;

pub const STABLECOIN_MIDPOINT: f64 = 0.5;
pub const STABLECOIN_STEEPNESS: f64 = 5.0;

/// Exponent of the debt-utilization penalty.
pub const DEBT_EXPONENT: f64 = 1.5;

/// Replace negative and non-finite inputs with 0.
pub fn sanitize(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 { x } else { 0.0 }
}

pub fn clamp01(x: f64) -> f64 {
    sanitize(x).min(1.0)
}

/// Linear map of `[lo, hi]` onto `[0, 1]`, clamped. Degenerate ranges yield 0.
pub fn normalize_01(x: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo || x.is_nan() {
        return 0.0;
    }
    (x.clamp(lo, hi) - lo) / (hi - lo)
}

/// `ln(1 + x) / ln(1 + reference)`, with `x` clamped to `>= 0`.
///
/// Not capped above: values past `reference` exceed 1.
pub fn log_norm(x: f64, reference: f64) -> f64 {
    (1.0 + sanitize(x)).ln() / (1.0 + reference).ln()
}

/// Base-2 logistic curve: `1 / (1 + 2^(-steepness * (ratio - midpoint)))`.
pub fn stablecoin_curve(ratio: f64) -> f64 {
    let r = clamp01(ratio);
    1.0 / (1.0 + 2f64.powf(-STABLECOIN_STEEPNESS * (r - STABLECOIN_MIDPOINT)))
}
