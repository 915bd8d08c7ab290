//! Attester key handling.

use std::fmt;

use alloy_primitives::{Address, B256, Signature};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use ccs_core::error::SigningError;
use zeroize::Zeroizing;

/// Environment variable holding the hex-encoded attester secret.
pub const ATTESTER_KEY_ENV: &str = "ATTESTER_PK";

/// A secp256k1 attester key. Never printed; `Debug` shows only the address.
#[derive(Clone)]
pub struct AttesterKey {
    signer: PrivateKeySigner,
}

impl AttesterKey {
    /// Parse a 32-byte secret from hex, with or without a `0x` prefix.
    pub fn from_hex(secret: &str) -> Result<Self, SigningError> {
        let trimmed = secret.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = Zeroizing::new(hex::decode(digits).map_err(|_| SigningError::InvalidKey)?);
        if bytes.len() != 32 {
            return Err(SigningError::InvalidKey);
        }
        let signer = PrivateKeySigner::from_slice(&bytes).map_err(|_| SigningError::InvalidKey)?;
        Ok(Self { signer })
    }

    /// Read the key from [`ATTESTER_KEY_ENV`].
    pub fn from_env() -> Result<Self, SigningError> {
        Self::from_env_var(ATTESTER_KEY_ENV)
    }

    pub fn from_env_var(var: &str) -> Result<Self, SigningError> {
        let secret = Zeroizing::new(std::env::var(var).map_err(|_| SigningError::KeyUnavailable)?);
        if secret.trim().is_empty() {
            return Err(SigningError::KeyUnavailable);
        }
        Self::from_hex(&secret)
    }

    /// Generate a fresh key from the OS RNG.
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub(crate) fn sign_hash(&self, hash: &B256) -> Result<Signature, SigningError> {
        self.signer
            .sign_hash_sync(hash)
            .map_err(|e| SigningError::Signer(e.to_string()))
    }
}

impl fmt::Debug for AttesterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttesterKey")
            .field("address", &self.address())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
