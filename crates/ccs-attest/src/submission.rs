//! Verifier-facing submission payload.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolCall;
use ccs_core::types::Attestation;
use serde::{Deserialize, Serialize};

use crate::message::submitCall;

/// Exactly the arguments of `submit(wallet, score, factorsRoot, validUntil,
/// nonce, signature)`. Building and broadcasting the transaction belongs to
/// the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub wallet: Address,
    pub score: U256,
    pub factors_root: B256,
    pub valid_until: U256,
    pub nonce: U256,
    pub signature: Bytes,
}

impl From<&Attestation> for ScoreSubmission {
    fn from(att: &Attestation) -> Self {
        Self {
            wallet: att.wallet,
            score: U256::from(att.score.value()),
            factors_root: att.factors_root.0,
            valid_until: U256::from(att.valid_until),
            nonce: att.nonce,
            signature: att.signature.clone(),
        }
    }
}

impl ScoreSubmission {
    /// ABI-encoded calldata for `submit`, selector included.
    pub fn calldata(&self) -> Bytes {
        submitCall {
            wallet: self.wallet,
            score: self.score,
            factorsRoot: self.factors_root,
            validUntil: self.valid_until,
            nonce: self.nonce,
            signature: self.signature.clone(),
        }
        .abi_encode()
        .into()
    }
}
