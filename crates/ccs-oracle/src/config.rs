//! Layered application configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults (`#[serde(default)]` on every section)
//! 2. a TOML file: `--config <path>` or `<config_dir>/ccs/config.toml`
//! 3. `CCS_*` environment variables, `__` between nested keys
//!    (`CCS_EXPLORER__API_KEY`, `CCS_PRICING__ETH_USD`)

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use ccs_attest::{AttestationDomain, NonceMode};
use ccs_core::constants::{DEFAULT_ETH_USD, DEFAULT_VALIDITY_SECS};
use ccs_core::error::ConfigError;
use ccs_core::params::ChainParams;
use ccs_etherscan::{EtherscanConfig, RetryPolicy};
use ccs_scoring::WeightTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "CCS";
/// Fallback for the explorer API key when `explorer.api_key` is unset.
pub const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("config source: {0}")] Source(#[from] config::ConfigError),
    #[error(transparent)] Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestationConfig {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub validity_secs: u64,
    pub nonce: NonceMode,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        let domain = AttestationDomain::default();
        Self {
            name: domain.name,
            version: domain.version,
            chain_id: domain.chain_id,
            verifying_contract: domain.verifying_contract,
            validity_secs: DEFAULT_VALIDITY_SECS,
            nonce: NonceMode::default(),
        }
    }
}

impl AttestationConfig {
    pub fn domain(&self) -> AttestationDomain {
        AttestationDomain {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub eth_usd: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            eth_usd: DEFAULT_ETH_USD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub explorer: EtherscanConfig,
    pub retry: RetryPolicy,
    pub weights: WeightTable,
    pub attestation: AttestationConfig,
    pub pricing: PricingConfig,
    pub chain: ChainParams,
    pub output_dir: PathBuf,
    /// Wallets scored at once by batch runs.
    pub concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            explorer: EtherscanConfig::default(),
            retry: RetryPolicy::default(),
            weights: WeightTable::default(),
            attestation: AttestationConfig::default(),
            pricing: PricingConfig::default(),
            chain: ChainParams::mainnet(),
            output_dir: PathBuf::from("."),
            concurrency: 4,
        }
    }
}

/// `<config_dir>/ccs/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ccs").join("config.toml"))
}

impl AppConfig {
    /// Load from `path` (required to exist) or the default location
    /// (optional), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let mut builder = config::Config::builder();
        match path {
            Some(p) => {
                debug!(path = %p.display(), "loading config file");
                builder = builder.add_source(config::File::from(p).required(true));
            }
            None => {
                if let Some(p) = default_config_path() {
                    builder = builder.add_source(config::File::from(p).required(false));
                }
            }
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: AppConfig = builder.build()?.try_deserialize()?;
        if cfg.explorer.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                cfg.explorer.api_key = key;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.chain.validate()?;
        if self.attestation.validity_secs == 0 {
            return Err(ConfigError::ZeroValidity);
        }
        Ok(())
    }
}
