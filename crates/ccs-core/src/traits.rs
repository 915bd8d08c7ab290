//! Trait interfaces at the pipeline boundaries.
//!
//! - [`DataSource`]: read-only explorer queries (ccs-etherscan implements)
//! - [`Publisher`]: hand-off of finished attestations to a verifier

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::error::{FetchError, PublishError};
use crate::types::{Attestation, BlockRange, LogRecord, TransactionRecord};

/// Read-only access to a wallet's on-chain history.
///
/// Empty results mean "no activity". Timeouts and server errors must be
/// returned as [`FetchError`], never masked as empty results.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// All transactions sent from or to `address`, ascending by timestamp.
    async fn list_transactions(&self, address: &Address)
    -> Result<Vec<TransactionRecord>, FetchError>;

    /// Logs emitted by `contract` with the given `topic0` inside `range`.
    async fn get_logs(
        &self,
        contract: &Address,
        topic0: &B256,
        range: BlockRange,
    ) -> Result<Vec<LogRecord>, FetchError>;

    /// Raw ERC-20 balance (smallest unit) of `holder` at the latest block.
    async fn get_token_balance(&self, token: &Address, holder: &Address)
    -> Result<U256, FetchError>;

    /// Native balance in wei at the latest block.
    async fn get_eth_balance(&self, address: &Address) -> Result<U256, FetchError>;
}

#[async_trait]
impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    async fn list_transactions(
        &self,
        address: &Address,
    ) -> Result<Vec<TransactionRecord>, FetchError> {
        (**self).list_transactions(address).await
    }

    async fn get_logs(
        &self,
        contract: &Address,
        topic0: &B256,
        range: BlockRange,
    ) -> Result<Vec<LogRecord>, FetchError> {
        (**self).get_logs(contract, topic0, range).await
    }

    async fn get_token_balance(
        &self,
        token: &Address,
        holder: &Address,
    ) -> Result<U256, FetchError> {
        (**self).get_token_balance(token, holder).await
    }

    async fn get_eth_balance(&self, address: &Address) -> Result<U256, FetchError> {
        (**self).get_eth_balance(address).await
    }
}

/// Delivers a finished attestation to whatever verifies it.
///
/// Transaction construction and broadcast belong to implementations.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, attestation: &Attestation) -> Result<(), PublishError>;
}
