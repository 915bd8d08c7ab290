//! HTTP client for the Etherscan query API.

use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use ccs_core::error::FetchError;
use ccs_core::traits::DataSource;
use ccs_core::types::{BlockRange, LogRecord, TransactionRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::records::{self, Envelope, Payload};

pub const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/api";

/// Upper block bound Etherscan accepts for "everything" on `txlist`.
const TXLIST_END_BLOCK: u64 = 99_999_999;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtherscanConfig {
    pub base_url: String,
    pub api_key: String,
    /// Sent as `chainid` for multichain (v2) endpoints.
    pub chain_id: Option<u64>,
    pub timeout_secs: u64,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            chain_id: None,
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for EtherscanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtherscanConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "[REDACTED]" })
            .field("chain_id", &self.chain_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EtherscanClient {
    cfg: EtherscanConfig,
    client: reqwest::Client,
}

impl EtherscanClient {
    pub fn new(cfg: EtherscanConfig) -> Result<Self, FetchError> {
        if cfg.base_url.trim().is_empty() {
            return Err(FetchError::Transport("base_url is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self { cfg, client })
    }

    pub fn config(&self) -> &EtherscanConfig {
        &self.cfg
    }

    /// Issue one `module`/`action` query and interpret its envelope.
    async fn query(
        &self,
        module: &'static str,
        action: &'static str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<Payload, FetchError> {
        params.push(("module", module.to_string()));
        params.push(("action", action.to_string()));
        if let Some(chain_id) = self.cfg.chain_id {
            params.push(("chainid", chain_id.to_string()));
        }
        params.push(("apikey", self.cfg.api_key.clone()));

        debug!(module, action, "explorer request");
        let resp = self
            .client
            .get(&self.cfg.base_url)
            .query(&params)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            warn!(action, status = status.as_u16(), "non-success status");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let body = resp.text().await.map_err(map_reqwest_error)?;
        let env: Envelope = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedEnvelope(e.to_string()))?;
        records::interpret(env)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    if err.is_decode() {
        return FetchError::MalformedEnvelope(err.to_string());
    }
    FetchError::Transport(err.to_string())
}

fn checksum(addr: &Address) -> String {
    addr.to_checksum(None)
}

#[async_trait]
impl DataSource for EtherscanClient {
    async fn list_transactions(
        &self,
        address: &Address,
    ) -> Result<Vec<TransactionRecord>, FetchError> {
        let items = self
            .query(
                "account",
                "txlist",
                vec![
                    ("address", checksum(address)),
                    ("startblock", "0".to_string()),
                    ("endblock", TXLIST_END_BLOCK.to_string()),
                    ("sort", "asc".to_string()),
                ],
            )
            .await?
            .into_items()?;
        let mut txs = records::parse_all("transaction", &items, records::parse_transaction);
        // Explorer order is ascending already; sort_by_key is stable so ties keep it.
        txs.sort_by_key(|t| t.timestamp);
        debug!(%address, count = txs.len(), "transactions fetched");
        Ok(txs)
    }

    async fn get_logs(
        &self,
        contract: &Address,
        topic0: &B256,
        range: BlockRange,
    ) -> Result<Vec<LogRecord>, FetchError> {
        let to_block = range
            .to
            .map(|b| b.to_string())
            .unwrap_or_else(|| "latest".to_string());
        let items = self
            .query(
                "logs",
                "getLogs",
                vec![
                    ("address", checksum(contract)),
                    ("fromBlock", range.from.to_string()),
                    ("toBlock", to_block),
                    ("topic0", alloy_primitives::hex::encode_prefixed(topic0)),
                ],
            )
            .await?
            .into_items()?;
        Ok(records::parse_all("log", &items, records::parse_log))
    }

    async fn get_token_balance(
        &self,
        token: &Address,
        holder: &Address,
    ) -> Result<U256, FetchError> {
        let payload = self
            .query(
                "account",
                "tokenbalance",
                vec![
                    ("contractaddress", checksum(token)),
                    ("address", checksum(holder)),
                    ("tag", "latest".to_string()),
                ],
            )
            .await?;
        Ok(records::balance_from(payload))
    }

    async fn get_eth_balance(&self, address: &Address) -> Result<U256, FetchError> {
        let payload = self
            .query(
                "account",
                "balance",
                vec![("address", checksum(address)), ("tag", "latest".to_string())],
            )
            .await?;
        Ok(records::balance_from(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_url_rejected() {
        let cfg = EtherscanConfig {
            base_url: "  ".into(),
            ..EtherscanConfig::default()
        };
        assert!(matches!(EtherscanClient::new(cfg), Err(FetchError::Transport(_))));
    }

    #[test]
    fn debug_hides_api_key() {
        let cfg = EtherscanConfig {
            api_key: "SECRETKEY123".into(),
            ..EtherscanConfig::default()
        };
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("SECRETKEY123"));
        assert!(shown.contains("REDACTED"));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let cfg = EtherscanConfig {
            base_url: "http://127.0.0.1:9/api".into(),
            timeout_secs: 2,
            ..EtherscanConfig::default()
        };
        let client = EtherscanClient::new(cfg).unwrap();
        let err = client.get_eth_balance(&Address::ZERO).await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error {err:?}");
    }
}
