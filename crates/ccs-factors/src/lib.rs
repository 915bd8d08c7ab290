//! # ccs-factors
//! Wallet factor extraction.
//!
//! Turns explorer data into a [`WalletFactors`](ccs_core::types::WalletFactors) record:
//! - **Protocol extractors**: repayment calls and liquidation events per
//!   lending protocol, dispatched through a [`ProtocolRegistry`].
//! - **Activity**: average transactions per day and staking tenure over
//!   the ascending transaction history.
//! - **Balances**: staking-derivative ETH equivalents and the stablecoin
//!   share of the portfolio.
//!
//! Upstream fetch failures propagate; individually malformed records are
//! already dropped by the data source.

pub mod activity;
pub mod balances;
pub mod extractor;
pub mod protocol;

pub use extractor::{ExtractionContext, FactorExtractor};
pub use protocol::{MarketsProtocol, PoolProtocol, ProtocolExtractor, ProtocolRegistry};
