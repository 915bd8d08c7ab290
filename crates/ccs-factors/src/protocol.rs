//! Per-protocol repayment and liquidation extraction.
//!
//! Each lending protocol is a [`ProtocolExtractor`]. The
//! [`ProtocolRegistry`] is built once from [`ChainParams`] and dispatches
//! over every configured protocol.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use ccs_core::error::FetchError;
use ccs_core::params::{ChainParams, ProtocolKind, ProtocolParams};
use ccs_core::traits::DataSource;
use ccs_core::types::{BlockRange, ProtocolStats, TransactionRecord};
use futures::future::try_join_all;
use tracing::debug;

/// Repayment/liquidation counting for one lending protocol.
#[async_trait]
pub trait ProtocolExtractor: Send + Sync {
    /// Stable identifier used in the factor detail breakdown.
    fn name(&self) -> &str;

    /// Count `wallet`'s repayments (from its own ascending `txs`) and the
    /// liquidations where it was the borrower.
    async fn extract(
        &self,
        wallet: &Address,
        txs: &[TransactionRecord],
        source: &dyn DataSource,
    ) -> Result<ProtocolStats, FetchError>;
}

/// Number of `txs` sent to `contract` whose method name contains any of `markers`.
///
/// Matching is a case-insensitive substring test, so it may over-count
/// names such as `repayWithATokens`. A transaction matching several
/// markers counts once.
pub fn count_repays(txs: &[TransactionRecord], contract: &Address, markers: &[String]) -> u64 {
    txs.iter()
        .filter(|tx| tx.is_call_to(contract))
        .filter(|tx| {
            markers
                .iter()
                .filter(|m| !m.is_empty())
                .any(|m| tx.function_name_contains(m))
        })
        .count() as u64
}

/// Liquidation logs from `contract` under `topic` that mention `borrower` in any topic slot.
pub async fn count_liquidations(
    source: &dyn DataSource,
    contract: &Address,
    topic: &B256,
    range: BlockRange,
    borrower: &Address,
) -> Result<u64, FetchError> {
    let logs = source.get_logs(contract, topic, range).await?;
    Ok(logs.iter().filter(|log| log.mentions(borrower)).count() as u64)
}

/// A protocol whose single pool contract serves every asset (Aave v3).
#[derive(Debug, Clone)]
pub struct PoolProtocol {
    name: String,
    pool: Address,
    liquidation_topic: B256,
    repay_markers: Vec<String>,
    log_range: BlockRange,
}

impl PoolProtocol {
    pub fn new(
        name: impl Into<String>,
        pool: Address,
        liquidation_topic: B256,
        repay_markers: Vec<String>,
        log_range: BlockRange,
    ) -> Self {
        Self {
            name: name.into(),
            pool,
            liquidation_topic,
            repay_markers,
            log_range,
        }
    }
}

#[async_trait]
impl ProtocolExtractor for PoolProtocol {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(
        &self,
        wallet: &Address,
        txs: &[TransactionRecord],
        source: &dyn DataSource,
    ) -> Result<ProtocolStats, FetchError> {
        let repay_count = count_repays(txs, &self.pool, &self.repay_markers);
        let liquidation_count = count_liquidations(
            source,
            &self.pool,
            &self.liquidation_topic,
            self.log_range,
            wallet,
        )
        .await?;

        debug!(protocol = %self.name, repay_count, liquidation_count, "pool protocol scanned");
        Ok(ProtocolStats {
            repay_count,
            liquidation_count,
        })
    }
}

/// A protocol with one contract per market (Compound v2). Counts are summed.
#[derive(Debug, Clone)]
pub struct MarketsProtocol {
    name: String,
    markets: Vec<Address>,
    liquidation_topic: B256,
    repay_markers: Vec<String>,
    log_range: BlockRange,
}

impl MarketsProtocol {
    pub fn new(
        name: impl Into<String>,
        markets: Vec<Address>,
        liquidation_topic: B256,
        repay_markers: Vec<String>,
        log_range: BlockRange,
    ) -> Self {
        Self {
            name: name.into(),
            markets,
            liquidation_topic,
            repay_markers,
            log_range,
        }
    }
}

#[async_trait]
impl ProtocolExtractor for MarketsProtocol {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(
        &self,
        wallet: &Address,
        txs: &[TransactionRecord],
        source: &dyn DataSource,
    ) -> Result<ProtocolStats, FetchError> {
        let liquidations = try_join_all(self.markets.iter().map(|market| {
            count_liquidations(source, market, &self.liquidation_topic, self.log_range, wallet)
        }))
        .await?;

        let stats: ProtocolStats = self
            .markets
            .iter()
            .zip(liquidations)
            .map(|(market, liquidation_count)| ProtocolStats {
                repay_count: count_repays(txs, market, &self.repay_markers),
                liquidation_count,
            })
            .sum();

        debug!(
            protocol = %self.name,
            markets = self.markets.len(),
            repay_count = stats.repay_count,
            liquidation_count = stats.liquidation_count,
            "markets protocol scanned"
        );
        Ok(stats)
    }
}

/// The set of protocol extractors a pipeline runs.
#[derive(Default)]
pub struct ProtocolRegistry {
    extractors: Vec<Box<dyn ProtocolExtractor>>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One extractor per protocol in `params`, in configuration order.
    pub fn from_params(params: &ChainParams) -> Self {
        let mut registry = Self::new();
        for p in &params.protocols {
            registry.register(build_extractor(p, params.log_range));
        }
        registry
    }

    pub fn register(&mut self, extractor: Box<dyn ProtocolExtractor>) {
        self.extractors.push(extractor);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ProtocolExtractor> {
        self.extractors.iter().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

fn build_extractor(p: &ProtocolParams, log_range: BlockRange) -> Box<dyn ProtocolExtractor> {
    match p.kind {
        ProtocolKind::Pool => Box::new(PoolProtocol::new(
            p.name.clone(),
            // Validated params carry exactly one pool contract.
            p.contracts.first().copied().unwrap_or_default(),
            p.liquidation_topic,
            p.repay_markers.clone(),
            log_range,
        )),
        ProtocolKind::Markets => Box::new(MarketsProtocol::new(
            p.name.clone(),
            p.contracts.clone(),
            p.liquidation_topic,
            p.repay_markers.clone(),
            log_range,
        )),
    }
}
