//! # ccs-attest
//! Signed score attestations.
//!
//! Builds the EIP-712 `Score` message `{wallet, score, factorsRoot,
//! validUntil, nonce}` under a configurable domain and signs it with a
//! secp256k1 attester key. Verifiers recover the attester address from
//! the signature; byte equality of signatures is never relied on.

pub mod domain;
pub mod key;
pub mod message;
pub mod nonce;
pub mod signer;
pub mod submission;

pub use domain::AttestationDomain;
pub use key::AttesterKey;
pub use nonce::{MonotonicNonce, NonceMode, NonceSource, RandomNonce, WallClockNonce};
pub use signer::{AttestationSigner, recover_attester, signing_hash, unix_now};
pub use submission::ScoreSubmission;
