//! # ccs-scoring
//! Weighted credit score computation.
//!
//! A pure, total function from [`WalletFactors`](ccs_core::types::WalletFactors)
//! and a [`WeightTable`] to a [`Score`](ccs_core::types::Score) in `[0, 100]`:
//! - each factor is sanitized (negative or non-finite → 0), normalized by
//!   its own curve in [`curves`], then scaled by its weight
//! - the default count uses fixed, weight-independent points
//! - the sum is clamped to `[0, 100]` and rounded half away from zero

pub mod curves;
pub mod engine;
pub mod weights;

pub use engine::{ScoreBreakdown, ScoringEngine};
pub use weights::WeightTable;
