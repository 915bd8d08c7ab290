//! Staking and stablecoin balance math.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use ccs_core::error::FetchError;
use ccs_core::params::TokenParams;
use ccs_core::traits::DataSource;
use futures::future::try_join_all;
use tracing::debug;

/// Convert a raw integer balance to a float amount: `raw / 10^decimals`.
pub fn scale_units(raw: U256, decimals: u8) -> f64 {
    if raw.is_zero() {
        return 0.0;
    }
    let whole: f64 = raw.to_string().parse().unwrap_or(0.0);
    whole / 10f64.powi(decimals as i32)
}

/// Per-token scaled amounts plus their sum.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenHoldings {
    pub by_symbol: BTreeMap<String, f64>,
    pub total: f64,
}

/// Fetch and scale the balances of `tokens` held by `holder`, concurrently.
pub async fn fetch_holdings(
    source: &dyn DataSource,
    tokens: &[TokenParams],
    holder: &Address,
) -> Result<TokenHoldings, FetchError> {
    let raws = try_join_all(
        tokens
            .iter()
            .map(|t| source.get_token_balance(&t.address, holder)),
    )
    .await?;

    let mut holdings = TokenHoldings::default();
    for (token, raw) in tokens.iter().zip(raws) {
        let amount = scale_units(raw, token.decimals);
        debug!(symbol = %token.symbol, %raw, amount, "token balance");
        *holdings.by_symbol.entry(token.symbol.clone()).or_default() += amount;
        holdings.total += amount;
    }
    Ok(holdings)
}

/// Stablecoin share of the portfolio.
///
/// Portfolio value is `(eth + staking_eth) * eth_usd + stable_usd`, with
/// stablecoins pegged at 1 USD. A portfolio worth nothing has ratio 0.
pub fn stablecoin_ratio(eth: f64, staking_eth: f64, stable_usd: f64, eth_usd: f64) -> f64 {
    let portfolio_usd = (eth + staking_eth) * eth_usd + stable_usd;
    if portfolio_usd.is_nan() || portfolio_usd <= 0.0 {
        return 0.0;
    }
    (stable_usd / portfolio_usd).clamp(0.0, 1.0)
}
