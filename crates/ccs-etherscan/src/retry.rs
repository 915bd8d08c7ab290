//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use ccs_core::error::FetchError;
use ccs_core::traits::DataSource;
use ccs_core::types::{BlockRange, LogRecord, TransactionRecord};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first. `0` is treated as `1`.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or
    /// attempts run out. The last error is returned.
    pub async fn run<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(v) => return Ok(v),
                Err(err) if attempt < attempts && err.is_retryable() => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after backoff"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Wraps any [`DataSource`] so every query is retried under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DataSource> DataSource for RetryingSource<S> {
    async fn list_transactions(
        &self,
        address: &Address,
    ) -> Result<Vec<TransactionRecord>, FetchError> {
        self.policy
            .run("txlist", || self.inner.list_transactions(address))
            .await
    }

    async fn get_logs(
        &self,
        contract: &Address,
        topic0: &B256,
        range: BlockRange,
    ) -> Result<Vec<LogRecord>, FetchError> {
        self.policy
            .run("getLogs", || self.inner.get_logs(contract, topic0, range))
            .await
    }

    async fn get_token_balance(
        &self,
        token: &Address,
        holder: &Address,
    ) -> Result<U256, FetchError> {
        self.policy
            .run("tokenbalance", || self.inner.get_token_balance(token, holder))
            .await
    }

    async fn get_eth_balance(&self, address: &Address) -> Result<U256, FetchError> {
        self.policy
            .run("balance", || self.inner.get_eth_balance(address))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    /// Fails with the queued errors, then returns a balance of 7.
    struct Flaky {
        errors: Mutex<Vec<FetchError>>,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(mut errors: Vec<FetchError>) -> Self {
            errors.reverse();
            Self {
                errors: Mutex::new(errors),
                calls: AtomicU32::new(0),
            }
        }

        fn next(&self) -> Result<(), FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.errors.lock().unwrap().pop() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl DataSource for Flaky {
        async fn list_transactions(&self, _: &Address) -> Result<Vec<TransactionRecord>, FetchError> {
            self.next().map(|_| Vec::new())
        }
        async fn get_logs(&self, _: &Address, _: &B256, _: BlockRange) -> Result<Vec<LogRecord>, FetchError> {
            self.next().map(|_| Vec::new())
        }
        async fn get_token_balance(&self, _: &Address, _: &Address) -> Result<U256, FetchError> {
            self.next().map(|_| U256::from(7u8))
        }
        async fn get_eth_balance(&self, _: &Address) -> Result<U256, FetchError> {
            self.next().map(|_| U256::from(7u8))
        }
    }

    // --- delays ---

    #[test]
    fn delay_doubles_and_caps() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_for(1), Duration::from_millis(250));
        assert_eq!(p.delay_for(2), Duration::from_millis(500));
        assert_eq!(p.delay_for(3), Duration::from_millis(1_000));
        assert_eq!(p.delay_for(10), Duration::from_millis(4_000));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_millis(4_000));
    }

    // --- retry behaviour ---

    #[tokio::test]
    async fn transient_errors_retried() {
        let src = RetryingSource::new(
            Flaky::new(vec![FetchError::Timeout, FetchError::HttpStatus(502)]),
            fast(3),
        );
        let bal = src.get_eth_balance(&Address::ZERO).await.unwrap();
        assert_eq!(bal, U256::from(7u8));
        assert_eq!(src.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejected_not_retried() {
        let src = RetryingSource::new(
            Flaky::new(vec![FetchError::Rejected("Invalid API Key".into())]),
            fast(5),
        );
        let err = src.list_transactions(&Address::ZERO).await.unwrap_err();
        assert_eq!(err, FetchError::Rejected("Invalid API Key".into()));
        assert_eq!(src.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_returns_last_error() {
        let src = RetryingSource::new(
            Flaky::new(vec![
                FetchError::Timeout,
                FetchError::RateLimited("slow down".into()),
                FetchError::HttpStatus(503),
            ]),
            fast(3),
        );
        let err = src
            .get_logs(&Address::ZERO, &B256::ZERO, BlockRange::default())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(503));
        assert_eq!(src.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_attempts_means_one() {
        let src = RetryingSource::new(Flaky::new(vec![FetchError::Timeout]), fast(0));
        assert!(src.get_token_balance(&Address::ZERO, &Address::ZERO).await.is_err());
        assert_eq!(src.inner().calls.load(Ordering::SeqCst), 1);
    }
}
