//! # ccs-etherscan
//! Etherscan-compatible [`DataSource`](ccs_core::traits::DataSource).
//!
//! - [`client`]: HTTP client over the `module=…&action=…` query API
//! - [`records`]: response envelope interpretation and tolerant record parsing
//! - [`retry`]: bounded exponential backoff wrapper for any data source

pub mod client;
pub mod records;
pub mod retry;

pub use client::{EtherscanClient, EtherscanConfig};
pub use retry::{RetryPolicy, RetryingSource};
