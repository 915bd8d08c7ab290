//! Wallet-level factor extraction.

use std::sync::Arc;

use alloy_primitives::Address;
use ccs_core::constants::{DEFAULT_ETH_USD, ETH_DECIMALS};
use ccs_core::error::FetchError;
use ccs_core::params::ChainParams;
use ccs_core::traits::DataSource;
use ccs_core::types::{FactorDetail, ProtocolStats, WalletFactors};
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::activity::{activity_frequency, staking_tenure_days};
use crate::balances::{fetch_holdings, scale_units, stablecoin_ratio};
use crate::protocol::ProtocolRegistry;

/// Per-call inputs that are not part of the chain configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionContext {
    /// Current Unix time, used for staking tenure.
    pub now: u64,
    /// ETH/USD price. [`DEFAULT_ETH_USD`] when `None`.
    pub eth_usd: Option<f64>,
}

impl ExtractionContext {
    pub fn new(now: u64) -> Self {
        Self { now, eth_usd: None }
    }

    pub fn with_eth_usd(mut self, price: f64) -> Self {
        self.eth_usd = Some(price);
        self
    }

    /// The effective price, never negative or NaN.
    pub fn eth_usd(&self) -> f64 {
        match self.eth_usd {
            Some(p) if p.is_finite() && p > 0.0 => p,
            Some(_) => 0.0,
            None => DEFAULT_ETH_USD,
        }
    }
}

/// Builds [`WalletFactors`] from a [`DataSource`].
///
/// Holds no per-wallet state, so one extractor can serve any number of
/// concurrent extractions.
pub struct FactorExtractor {
    params: Arc<ChainParams>,
    registry: ProtocolRegistry,
}

impl FactorExtractor {
    pub fn new(params: Arc<ChainParams>) -> Self {
        let registry = ProtocolRegistry::from_params(&params);
        Self { params, registry }
    }

    /// Use a custom registry instead of the one derived from `params`.
    pub fn with_registry(params: Arc<ChainParams>, registry: ProtocolRegistry) -> Self {
        Self { params, registry }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    /// Extract the factor set for `wallet`.
    ///
    /// Independent queries run concurrently. Any [`FetchError`] aborts the
    /// extraction; nothing is defaulted to zero on upstream failure.
    pub async fn extract(
        &self,
        wallet: &Address,
        source: &dyn DataSource,
        ctx: ExtractionContext,
    ) -> Result<WalletFactors, FetchError> {
        let eth_usd = ctx.eth_usd();

        let (eth_wei, txs, staking, stables) = futures::try_join!(
            source.get_eth_balance(wallet),
            source.list_transactions(wallet),
            fetch_holdings(source, &self.params.staking_tokens, wallet),
            fetch_holdings(source, &self.params.stablecoins, wallet),
        )?;
        debug!(wallet = %wallet, tx_count = txs.len(), "history fetched");

        let per_protocol = try_join_all(
            self.registry
                .iter()
                .map(|p| p.extract(wallet, &txs, source)),
        )
        .await?;

        let mut detail = FactorDetail::default();
        for (protocol, stats) in self.registry.iter().zip(&per_protocol) {
            *detail.protocols.entry(protocol.name().to_string()).or_default() += *stats;
        }
        let totals: ProtocolStats = per_protocol.into_iter().sum();

        let eth_balance = scale_units(eth_wei, ETH_DECIMALS);
        let ratio = stablecoin_ratio(eth_balance, staking.total, stables.total, eth_usd);

        detail.staking = staking.by_symbol;
        detail.stablecoins = stables.by_symbol;
        detail.stable_usd = stables.total;

        let settled = totals.repay_count.saturating_add(totals.liquidation_count);
        let factors = WalletFactors {
            on_time_repayment_rate: totals.repay_count as f64 / settled.max(1) as f64,
            default_count: totals.liquidation_count,
            avg_tx_frequency: activity_frequency(&txs),
            avg_balance_usd: eth_balance * eth_usd,
            stablecoin_ratio: ratio,
            debt_utilization: 0.0,
            staking_amount_eth: staking.total,
            staking_tenure_days: staking_tenure_days(&txs, wallet, ctx.now),
            detail,
        };

        info!(
            wallet = %wallet,
            repays = totals.repay_count,
            liquidations = totals.liquidation_count,
            staking_eth = factors.staking_amount_eth,
            stablecoin_ratio = factors.stablecoin_ratio,
            "factors extracted"
        );
        Ok(factors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};
    use async_trait::async_trait;
    use ccs_core::constants::{AAVE_V3_POOL, SECONDS_PER_DAY};
    use ccs_core::types::{BlockRange, LogRecord, TransactionRecord};

    const NOW: u64 = 1_760_000_000;

    fn wallet() -> Address {
        Address::repeat_byte(0xbe)
    }

    /// A source with a fixed transaction list and nothing else.
    struct TxOnly {
        txs: Vec<TransactionRecord>,
        fail_logs: bool,
    }

    #[async_trait]
    impl DataSource for TxOnly {
        async fn list_transactions(
            &self,
            _address: &Address,
        ) -> Result<Vec<TransactionRecord>, FetchError> {
            Ok(self.txs.clone())
        }

        async fn get_logs(
            &self,
            _contract: &Address,
            _topic0: &B256,
            _range: BlockRange,
        ) -> Result<Vec<LogRecord>, FetchError> {
            if self.fail_logs {
                Err(FetchError::HttpStatus(502))
            } else {
                Ok(Vec::new())
            }
        }

        async fn get_token_balance(
            &self,
            _token: &Address,
            _holder: &Address,
        ) -> Result<U256, FetchError> {
            Ok(U256::ZERO)
        }

        async fn get_eth_balance(&self, _address: &Address) -> Result<U256, FetchError> {
            Ok(U256::ZERO)
        }
    }

    fn extractor() -> FactorExtractor {
        FactorExtractor::new(Arc::new(ChainParams::mainnet()))
    }

    #[test]
    fn context_price_defaults_and_sanitizes() {
        assert_eq!(ExtractionContext::new(0).eth_usd(), DEFAULT_ETH_USD);
        assert_eq!(ExtractionContext::new(0).with_eth_usd(2500.0).eth_usd(), 2500.0);
        assert_eq!(ExtractionContext::new(0).with_eth_usd(-1.0).eth_usd(), 0.0);
        assert_eq!(ExtractionContext::new(0).with_eth_usd(f64::NAN).eth_usd(), 0.0);
    }

    #[tokio::test]
    async fn empty_history_yields_zero_activity_and_tenure() {
        let source = TxOnly { txs: Vec::new(), fail_logs: false };
        let f = extractor()
            .extract(&wallet(), &source, ExtractionContext::new(NOW))
            .await
            .unwrap();
        assert_eq!(f.avg_tx_frequency, 0.0);
        assert_eq!(f.staking_tenure_days, 0);
        assert_eq!(f.default_count, 0);
        assert_eq!(f.on_time_repayment_rate, 0.0);
        assert_eq!(f.stablecoin_ratio, 0.0);
        assert_eq!(f.debt_utilization, 0.0);
    }

    #[tokio::test]
    async fn two_repays_no_liquidations_is_perfect_rate() {
        let repay = |ts: u64| TransactionRecord {
            hash: format!("0x{ts:x}"),
            timestamp: ts,
            from: Some(wallet()),
            to: Some(AAVE_V3_POOL),
            function_name: "repay(address,uint256,uint256,address)".into(),
        };
        let source = TxOnly {
            txs: vec![repay(NOW - SECONDS_PER_DAY), repay(NOW)],
            fail_logs: false,
        };
        let f = extractor()
            .extract(&wallet(), &source, ExtractionContext::new(NOW))
            .await
            .unwrap();
        assert_eq!(f.on_time_repayment_rate, 1.0);
        assert_eq!(f.default_count, 0);
        assert_eq!(f.detail.protocols["aave_v3"].repay_count, 2);
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let source = TxOnly { txs: Vec::new(), fail_logs: true };
        let err = extractor()
            .extract(&wallet(), &source, ExtractionContext::new(NOW))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(502));
    }

    #[tokio::test]
    async fn tenure_from_last_inbound() {
        let t = NOW - 40 * SECONDS_PER_DAY - 1;
        let source = TxOnly {
            txs: vec![TransactionRecord {
                hash: "0x1".into(),
                timestamp: t,
                from: Some(Address::repeat_byte(0x01)),
                to: Some(wallet()),
                function_name: String::new(),
            }],
            fail_logs: false,
        };
        let f = extractor()
            .extract(&wallet(), &source, ExtractionContext::new(NOW))
            .await
            .unwrap();
        assert_eq!(f.staking_tenure_days, (NOW - t) / SECONDS_PER_DAY);
    }
}
