//! Pipeline composition: extract → {score, commit} → sign.
//!
//! Scoring and commitment both complete before the signer is invoked, so a
//! failed extraction never yields a partial attestation.

use std::sync::Arc;

use alloy_primitives::Address;
use ccs_attest::AttestationSigner;
use ccs_core::error::{ConfigError, CreditError, FetchError, SigningError};
use ccs_core::merkle::commit_factors;
use ccs_core::params::ChainParams;
use ccs_core::traits::DataSource;
use ccs_core::types::{Attestation, FactorsRoot, Score, WalletFactors};
use ccs_factors::{ExtractionContext, FactorExtractor};
use ccs_scoring::{ScoreBreakdown, ScoringEngine};
use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Everything computed for one wallet before signing.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub wallet: Address,
    pub score: Score,
    pub factors_root: FactorsRoot,
    pub factors: WalletFactors,
    pub breakdown: ScoreBreakdown,
    pub scored_at: u64,
}

/// A report plus its attestation, when a signer is configured.
#[derive(Debug, Clone)]
pub struct ScoringRun {
    pub report: ScoreReport,
    pub attestation: Option<Attestation>,
}

pub struct ScoringPipeline {
    source: Arc<dyn DataSource>,
    extractor: FactorExtractor,
    engine: ScoringEngine,
    signer: Option<AttestationSigner>,
    eth_usd: Option<f64>,
}

impl ScoringPipeline {
    pub fn new(source: Arc<dyn DataSource>, params: Arc<ChainParams>, engine: ScoringEngine) -> Self {
        Self {
            source,
            extractor: FactorExtractor::new(params),
            engine,
            signer: None,
            eth_usd: None,
        }
    }

    /// Build from validated application config. No signer is attached.
    pub fn from_config(cfg: &AppConfig, source: Arc<dyn DataSource>) -> Result<Self, ConfigError> {
        cfg.chain.validate()?;
        let engine = ScoringEngine::new(cfg.weights)?;
        Ok(Self::new(source, Arc::new(cfg.chain.clone()), engine).with_eth_usd(cfg.pricing.eth_usd))
    }

    pub fn with_signer(mut self, signer: AttestationSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_eth_usd(mut self, price: f64) -> Self {
        self.eth_usd = Some(price);
        self
    }

    pub fn signer(&self) -> Option<&AttestationSigner> {
        self.signer.as_ref()
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    fn context(&self, now: u64) -> ExtractionContext {
        let ctx = ExtractionContext::new(now);
        match self.eth_usd {
            Some(p) => ctx.with_eth_usd(p),
            None => ctx,
        }
    }

    pub async fn extract(&self, wallet: &Address, now: u64) -> Result<WalletFactors, FetchError> {
        self.extractor
            .extract(wallet, self.source.as_ref(), self.context(now))
            .await
    }

    /// Extract, score and commit. No signing.
    pub async fn evaluate(&self, wallet: &Address, now: u64) -> Result<ScoreReport, FetchError> {
        let factors = self.extract(wallet, now).await?;
        let breakdown = self.engine.breakdown(&factors);
        let score = breakdown.score();
        let factors_root = commit_factors(&factors);
        info!(wallet = %wallet, score = score.value(), root = %factors_root, "wallet scored");
        Ok(ScoreReport {
            wallet: *wallet,
            score,
            factors_root,
            factors,
            breakdown,
            scored_at: now,
        })
    }

    /// Evaluate, then sign when a signer is configured.
    pub async fn run(&self, wallet: &Address, now: u64) -> Result<ScoringRun, CreditError> {
        let report = self.evaluate(wallet, now).await?;
        let attestation = match &self.signer {
            Some(signer) => Some(signer.sign(report.wallet, report.score, report.factors_root, now)?),
            None => None,
        };
        Ok(ScoringRun { report, attestation })
    }

    /// Like [`run`](Self::run) but a signer is mandatory.
    pub async fn attest(&self, wallet: &Address, now: u64) -> Result<(ScoreReport, Attestation), CreditError> {
        if self.signer.is_none() {
            return Err(SigningError::KeyUnavailable.into());
        }
        let run = self.run(wallet, now).await?;
        match run.attestation {
            Some(att) => Ok((run.report, att)),
            None => Err(SigningError::KeyUnavailable.into()),
        }
    }

    /// Score several wallets, at most `concurrency` at a time. Results keep
    /// the input order; one wallet failing does not affect the others.
    pub async fn score_many(
        &self,
        wallets: &[Address],
        now: u64,
        concurrency: usize,
    ) -> Vec<(Address, Result<ScoringRun, CreditError>)> {
        futures::stream::iter(wallets.iter().copied())
            .map(|wallet| async move {
                let result = self.run(&wallet, now).await;
                if let Err(err) = &result {
                    warn!(wallet = %wallet, error = %err, "wallet scoring failed");
                }
                (wallet, result)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};
    use async_trait::async_trait;
    use ccs_attest::AttesterKey;
    use ccs_core::types::{BlockRange, LogRecord, TransactionRecord};
    use std::sync::atomic::{AtomicBool, Ordering};

    const NOW: u64 = 1_760_000_000;

    /// Empty history; optionally failing the balance query.
    #[derive(Default)]
    struct Quiet {
        fail_balance: AtomicBool,
    }

    #[async_trait]
    impl DataSource for Quiet {
        async fn list_transactions(&self, _: &Address) -> Result<Vec<TransactionRecord>, FetchError> {
            Ok(Vec::new())
        }
        async fn get_logs(&self, _: &Address, _: &B256, _: BlockRange) -> Result<Vec<LogRecord>, FetchError> {
            Ok(Vec::new())
        }
        async fn get_token_balance(&self, _: &Address, _: &Address) -> Result<U256, FetchError> {
            Ok(U256::ZERO)
        }
        async fn get_eth_balance(&self, _: &Address) -> Result<U256, FetchError> {
            if self.fail_balance.load(Ordering::SeqCst) {
                Err(FetchError::Timeout)
            } else {
                Ok(U256::ZERO)
            }
        }
    }

    fn pipeline(source: Arc<Quiet>) -> ScoringPipeline {
        ScoringPipeline::new(source, Arc::new(ChainParams::mainnet()), ScoringEngine::default())
    }

    #[tokio::test]
    async fn evaluate_empty_wallet() {
        let p = pipeline(Arc::new(Quiet::default()));
        let report = p.evaluate(&Address::repeat_byte(1), NOW).await.unwrap();
        assert_eq!(report.score.value(), 37);
        assert_eq!(report.factors_root, commit_factors(&report.factors));
        assert!(!report.factors_root.is_zero());
    }

    #[tokio::test]
    async fn run_without_signer_has_no_attestation() {
        let p = pipeline(Arc::new(Quiet::default()));
        let run = p.run(&Address::repeat_byte(1), NOW).await.unwrap();
        assert!(run.attestation.is_none());
    }

    #[tokio::test]
    async fn attest_requires_signer() {
        let p = pipeline(Arc::new(Quiet::default()));
        let err = p.attest(&Address::repeat_byte(1), NOW).await.unwrap_err();
        assert!(matches!(err, CreditError::Signing(SigningError::KeyUnavailable)));
    }

    #[tokio::test]
    async fn fetch_failure_never_signs() {
        let src = Arc::new(Quiet::default());
        src.fail_balance.store(true, Ordering::SeqCst);
        let p = pipeline(src).with_signer(AttestationSigner::with_defaults(AttesterKey::random()));
        let err = p.run(&Address::repeat_byte(1), NOW).await.unwrap_err();
        assert!(matches!(err, CreditError::Fetch(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn attestation_binds_report() {
        let p = pipeline(Arc::new(Quiet::default()))
            .with_signer(AttestationSigner::with_defaults(AttesterKey::random()));
        let (report, att) = p.attest(&Address::repeat_byte(1), NOW).await.unwrap();
        assert_eq!(att.wallet, report.wallet);
        assert_eq!(att.score, report.score);
        assert_eq!(att.factors_root, report.factors_root);
        assert_eq!(att.valid_until, NOW + 3_600);
    }

    #[tokio::test]
    async fn score_many_keeps_order() {
        let p = pipeline(Arc::new(Quiet::default()));
        let wallets: Vec<Address> = (1u8..=5).map(Address::repeat_byte).collect();
        let results = p.score_many(&wallets, NOW, 2).await;
        assert_eq!(results.iter().map(|(w, _)| *w).collect::<Vec<_>>(), wallets);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
    }

    #[test]
    fn from_config_rejects_bad_weights() {
        let mut cfg = AppConfig::default();
        cfg.weights.default_count = 0;
        let err = ScoringPipeline::from_config(&cfg, Arc::new(Quiet::default())).err().unwrap();
        assert_eq!(err, ConfigError::WeightSum(75));
    }
}
