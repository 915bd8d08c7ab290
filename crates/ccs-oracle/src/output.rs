//! Output artifacts: `score.json` and the attestation JSON publisher.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use async_trait::async_trait;
use ccs_attest::ScoreSubmission;
use ccs_core::error::PublishError;
use ccs_core::traits::Publisher;
use ccs_core::types::{Attestation, FactorValue, FactorsRoot};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pipeline::ScoreReport;

pub const SCORE_FILE: &str = "score.json";

/// Persisted result object. `score` is the only field consumers rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreArtifact {
    pub score: u8,
    pub wallet: Address,
    pub factors_root: FactorsRoot,
    pub factors: BTreeMap<String, FactorValue>,
    pub scored_at: u64,
    /// RFC 3339 rendering of `scored_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scored_at_utc: Option<String>,
}

impl From<&ScoreReport> for ScoreArtifact {
    fn from(report: &ScoreReport) -> Self {
        Self {
            score: report.score.value(),
            wallet: report.wallet,
            factors_root: report.factors_root,
            factors: report
                .factors
                .factor_pairs()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            scored_at: report.scored_at,
            scored_at_utc: i64::try_from(report.scored_at)
                .ok()
                .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
                .map(|t| t.to_rfc3339()),
        }
    }
}

fn io_err(path: &Path, err: std::io::Error) -> PublishError {
    PublishError::Io(format!("{}: {err}", path.display()))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PublishError> {
    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| PublishError::Serialization(e.to_string()))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_err(parent, e))?;
    }
    tokio::fs::write(path, body).await.map_err(|e| io_err(path, e))
}

/// Write `<dir>/score.json` and return its path.
pub async fn write_score_artifact(dir: &Path, report: &ScoreReport) -> Result<PathBuf, PublishError> {
    let path = dir.join(SCORE_FILE);
    write_json(&path, &ScoreArtifact::from(report)).await?;
    info!(path = %path.display(), score = report.score.value(), "score artifact written");
    Ok(path)
}

/// On-disk form of a published attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedAttestation {
    #[serde(flatten)]
    pub submission: ScoreSubmission,
    /// ABI-encoded `submit(...)` calldata.
    pub calldata: alloy_primitives::Bytes,
}

/// Writes each attestation to `<dir>/attestation-<wallet>-<nonce>.json`.
#[derive(Debug, Clone)]
pub struct JsonFilePublisher {
    dir: PathBuf,
}

impl JsonFilePublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, att: &Attestation) -> PathBuf {
        self.dir
            .join(format!("attestation-{:#x}-{}.json", att.wallet, att.nonce))
    }
}

#[async_trait]
impl Publisher for JsonFilePublisher {
    async fn publish(&self, att: &Attestation) -> Result<(), PublishError> {
        if att.signature.is_empty() {
            return Err(PublishError::Rejected("attestation is unsigned".to_string()));
        }
        let submission = ScoreSubmission::from(att);
        let record = PublishedAttestation {
            calldata: submission.calldata(),
            submission,
        };
        let path = self.path_for(att);
        write_json(&path, &record).await?;
        info!(wallet = %att.wallet, path = %path.display(), "attestation published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, Bytes, U256};
    use ccs_core::types::{Score, WalletFactors};
    use ccs_scoring::ScoringEngine;

    fn report() -> ScoreReport {
        let factors = WalletFactors {
            default_count: 1,
            staking_amount_eth: 2.0,
            ..WalletFactors::default()
        };
        let breakdown = ScoringEngine::default().breakdown(&factors);
        ScoreReport {
            wallet: Address::repeat_byte(0x5a),
            score: breakdown.score(),
            factors_root: ccs_core::merkle::commit_factors(&factors),
            factors,
            breakdown,
            scored_at: 1_700_000_000,
        }
    }

    fn attestation() -> Attestation {
        Attestation {
            wallet: Address::repeat_byte(0x5a),
            score: Score::saturating(55),
            factors_root: FactorsRoot(B256::repeat_byte(1)),
            valid_until: 1_700_003_600,
            nonce: U256::from(77u8),
            signature: Bytes::from(vec![1u8; 65]),
        }
    }

    // --- score.json ---

    #[tokio::test]
    async fn score_file_has_score_field() {
        let dir = tempfile::tempdir().unwrap();
        let r = report();
        let path = write_score_artifact(dir.path(), &r).await.unwrap();
        assert_eq!(path.file_name().unwrap(), SCORE_FILE);

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["score"], serde_json::json!(r.score.value()));
        assert_eq!(raw["factors"]["default_count"], serde_json::json!(1));
        assert_eq!(raw["scored_at_utc"], serde_json::json!("2023-11-14T22:13:20+00:00"));
    }

    #[tokio::test]
    async fn score_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let r = report();
        let path = write_score_artifact(&dir.path().join("nested"), &r).await.unwrap();
        let back: ScoreArtifact = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(back, ScoreArtifact::from(&r));
    }

    // --- publisher ---

    #[tokio::test]
    async fn publisher_writes_submission() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = JsonFilePublisher::new(dir.path());
        let att = attestation();
        publisher.publish(&att).await.unwrap();

        let written: PublishedAttestation =
            serde_json::from_slice(&std::fs::read(publisher.path_for(&att)).unwrap()).unwrap();
        assert_eq!(written.submission, ScoreSubmission::from(&att));
        assert_eq!(written.calldata, written.submission.calldata());
    }

    #[tokio::test]
    async fn unsigned_attestation_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = JsonFilePublisher::new(dir.path());
        let mut att = attestation();
        att.signature = Bytes::new();
        assert!(matches!(publisher.publish(&att).await, Err(PublishError::Rejected(_))));
    }
}
