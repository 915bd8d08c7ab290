//! Error types for the scoring pipeline.
use thiserror::Error;

/// An upstream explorer call failed. Fatal to the current extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")] Timeout,
    #[error("transport: {0}")] Transport(String),
    #[error("http status {0}")] HttpStatus(u16),
    #[error("malformed response envelope: {0}")] MalformedEnvelope(String),
    #[error("explorer rejected request: {0}")] Rejected(String),
    #[error("rate limited: {0}")] RateLimited(String),
}

impl FetchError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) | Self::RateLimited(_) => true,
            Self::HttpStatus(code) => *code == 429 || *code >= 500,
            Self::MalformedEnvelope(_) | Self::Rejected(_) => false,
        }
    }
}

/// A single explorer record is unusable. Recovered locally by skipping it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing field: {0}")] MissingField(&'static str),
    #[error("non-numeric {field}: {value:?}")] NotNumeric { field: &'static str, value: String },
    #[error("invalid address: {0:?}")] InvalidAddress(String),
    #[error("invalid topic: {0:?}")] InvalidTopic(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("weights must sum to 100, got {0}")] WeightSum(u32),
    #[error("protocol {0} has no contracts")] NoContracts(String),
    #[error("pool protocol {name} must have exactly one contract, got {count}")] PoolContracts { name: String, count: usize },
    #[error("protocol {0} has no repay markers")] NoRepayMarkers(String),
    #[error("token {symbol} has unsupported decimals {decimals}")] Decimals { symbol: String, decimals: u8 },
    #[error("validity window must be positive")] ZeroValidity,
    #[error("invalid address: {0}")] InvalidAddress(String),
}

/// Attestation could not be produced. Nothing is emitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("attester key unavailable")] KeyUnavailable,
    #[error("attester key is not a valid secp256k1 secret")] InvalidKey,
    #[error("timestamp overflow computing validity window")] ValidityOverflow,
    #[error("signer: {0}")] Signer(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("io: {0}")] Io(String),
    #[error("serialization: {0}")] Serialization(String),
    #[error("rejected: {0}")] Rejected(String),
}

#[derive(Error, Debug)]
pub enum CreditError {
    #[error(transparent)] Fetch(#[from] FetchError),
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Signing(#[from] SigningError),
    #[error(transparent)] Publish(#[from] PublishError),
}
