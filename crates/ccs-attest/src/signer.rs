//! Attestation signing and recovery.

use alloy_primitives::{Address, B256, Bytes, Signature};
use alloy_sol_types::{Eip712Domain, SolStruct};
use ccs_core::constants::DEFAULT_VALIDITY_SECS;
use ccs_core::error::{ConfigError, SigningError};
use ccs_core::types::{Attestation, FactorsRoot, Score};
use tracing::info;

use crate::domain::AttestationDomain;
use crate::key::AttesterKey;
use crate::message;
use crate::nonce::{NonceSource, RandomNonce};

/// Current unix time in seconds. Clock before the epoch reads as 0.
pub fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// EIP-712 digest the attester signs for `att` (signature field ignored).
pub fn signing_hash(att: &Attestation, domain: &Eip712Domain) -> B256 {
    message::Score::from(att).eip712_signing_hash(domain)
}

/// Recover the address that signed `att` under `domain`.
pub fn recover_attester(att: &Attestation, domain: &Eip712Domain) -> Result<Address, SigningError> {
    let sig = Signature::try_from(att.signature.as_ref())
        .map_err(|e| SigningError::Signer(e.to_string()))?;
    sig.recover_address_from_prehash(&signing_hash(att, domain))
        .map_err(|e| SigningError::Signer(e.to_string()))
}

/// Signs `{wallet, score, factorsRoot, validUntil, nonce}` under a fixed domain.
pub struct AttestationSigner {
    key: AttesterKey,
    domain: Eip712Domain,
    validity_secs: u64,
    nonces: Box<dyn NonceSource>,
}

impl AttestationSigner {
    pub fn new(
        key: AttesterKey,
        domain: &AttestationDomain,
        validity_secs: u64,
    ) -> Result<Self, ConfigError> {
        if validity_secs == 0 {
            return Err(ConfigError::ZeroValidity);
        }
        Ok(Self {
            key,
            domain: domain.to_eip712(),
            validity_secs,
            nonces: Box::new(RandomNonce),
        })
    }

    /// Default domain, one-hour validity, random nonces.
    pub fn with_defaults(key: AttesterKey) -> Self {
        Self {
            key,
            domain: AttestationDomain::default().to_eip712(),
            validity_secs: DEFAULT_VALIDITY_SECS,
            nonces: Box::new(RandomNonce),
        }
    }

    pub fn with_nonce_source(mut self, nonces: Box<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }

    pub fn attester(&self) -> Address {
        self.key.address()
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn validity_secs(&self) -> u64 {
        self.validity_secs
    }

    /// Produce a signed attestation valid until `now + validity`.
    pub fn sign(
        &self,
        wallet: Address,
        score: Score,
        factors_root: FactorsRoot,
        now: u64,
    ) -> Result<Attestation, SigningError> {
        let valid_until = now
            .checked_add(self.validity_secs)
            .ok_or(SigningError::ValidityOverflow)?;
        let mut att = Attestation {
            wallet,
            score,
            factors_root,
            valid_until,
            nonce: self.nonces.next_nonce(now),
            signature: Bytes::new(),
        };
        let digest = signing_hash(&att, &self.domain);
        let sig = self.key.sign_hash(&digest)?;
        att.signature = Bytes::copy_from_slice(&sig.as_bytes());

        info!(
            %wallet,
            score = score.value(),
            root = %factors_root,
            valid_until,
            attester = %self.key.address(),
            "attestation signed"
        );
        Ok(att)
    }
}
