//! # ccs-core
//! Foundation types, traits, and the factor commitment for CryptoCreditScore.

pub mod constants;
pub mod error;
pub mod merkle;
pub mod params;
pub mod traits;
pub mod types;
