//! Chain parameters: the immutable contract/token tables the extractor runs against.
//!
//! A [`ChainParams`] value is passed into the pipeline at construction, so
//! several networks can be scored side by side in one process.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::constants::{self, DEFAULT_TOKEN_DECIMALS, MAX_TOKEN_DECIMALS};
use crate::error::ConfigError;
use crate::types::BlockRange;

/// How a lending protocol lays out its contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    /// A single pool contract handles every asset (Aave v3).
    Pool,
    /// One market contract per asset; counts are summed (Compound v2).
    Markets,
}

/// One lending protocol to scan for repayments and liquidations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    pub name: String,
    pub kind: ProtocolKind,
    pub contracts: Vec<Address>,
    /// `topic0` of the liquidation event.
    pub liquidation_topic: B256,
    /// Method-name substrings identifying a repayment call.
    pub repay_markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParams {
    pub symbol: String,
    pub address: Address,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_decimals() -> u8 {
    DEFAULT_TOKEN_DECIMALS
}

impl TokenParams {
    pub fn new(symbol: &str, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            address,
            decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub protocols: Vec<ProtocolParams>,
    pub staking_tokens: Vec<TokenParams>,
    pub stablecoins: Vec<TokenParams>,
    #[serde(default)]
    pub log_range: BlockRange,
}

impl ChainParams {
    /// Ethereum mainnet: Aave v3, Compound v2 (cDAI, cUSDC), stETH/rETH, USDT/USDC/DAI.
    pub fn mainnet() -> Self {
        let markers = |m: &[&str]| m.iter().map(|s| s.to_string()).collect();
        Self {
            protocols: vec![
                ProtocolParams {
                    name: "aave_v3".to_string(),
                    kind: ProtocolKind::Pool,
                    contracts: vec![constants::AAVE_V3_POOL],
                    liquidation_topic: constants::AAVE_LIQUIDATION_CALL_TOPIC,
                    repay_markers: markers(constants::AAVE_REPAY_MARKERS),
                },
                ProtocolParams {
                    name: "compound_v2".to_string(),
                    kind: ProtocolKind::Markets,
                    contracts: vec![constants::COMPOUND_CDAI, constants::COMPOUND_CUSDC],
                    liquidation_topic: constants::COMPOUND_LIQUIDATE_BORROW_TOPIC,
                    repay_markers: markers(constants::COMPOUND_REPAY_MARKERS),
                },
            ],
            staking_tokens: vec![
                TokenParams::new("stETH", constants::STETH, 18),
                TokenParams::new("rETH", constants::RETH, 18),
            ],
            stablecoins: vec![
                TokenParams::new("USDT", constants::USDT, 6),
                TokenParams::new("USDC", constants::USDC, 6),
                TokenParams::new("DAI", constants::DAI, 18),
            ],
            log_range: BlockRange::default(),
        }
    }

    /// Reject tables the extractor cannot run against.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for p in &self.protocols {
            if p.contracts.is_empty() {
                return Err(ConfigError::NoContracts(p.name.clone()));
            }
            if p.kind == ProtocolKind::Pool && p.contracts.len() != 1 {
                return Err(ConfigError::PoolContracts {
                    name: p.name.clone(),
                    count: p.contracts.len(),
                });
            }
            if p.repay_markers.iter().all(|m| m.is_empty()) {
                return Err(ConfigError::NoRepayMarkers(p.name.clone()));
            }
        }
        for t in self.staking_tokens.iter().chain(&self.stablecoins) {
            if t.decimals > MAX_TOKEN_DECIMALS {
                return Err(ConfigError::Decimals {
                    symbol: t.symbol.clone(),
                    decimals: t.decimals,
                });
            }
        }
        Ok(())
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::mainnet()
    }
}
