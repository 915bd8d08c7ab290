//! Core data types: explorer records, extracted factors, scores, and attestations.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{self, CANONICAL_FLOAT_DIGITS, MAX_SCORE};

/// A wallet transaction as reported by the explorer.
///
/// Lists handed to the extractor must be ascending by `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub from: Option<Address>,
    /// `None` for contract creations.
    pub to: Option<Address>,
    /// Decoded method signature, e.g. `repayBorrow(uint256)`. May be empty.
    pub function_name: String,
}

impl TransactionRecord {
    /// Whether the transaction was sent to `target`.
    pub fn is_call_to(&self, target: &Address) -> bool {
        self.to.as_ref() == Some(target)
    }

    /// Case-insensitive substring match of `marker` against the method name.
    ///
    /// Intentionally broad: the marker `repay(` matches only `repay(...)`,
    /// but `repayborrow` also matches `repayBorrowBehalf(...)`.
    pub fn function_name_contains(&self, marker: &str) -> bool {
        self.function_name
            .to_ascii_lowercase()
            .contains(&marker.to_ascii_lowercase())
    }
}

/// An event log emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub address: Address,
    /// `topics[0]` is the event signature hash.
    pub topics: Vec<B256>,
}

impl LogRecord {
    /// Whether `account`, left-padded to 32 bytes, appears in any topic slot.
    pub fn mentions(&self, account: &Address) -> bool {
        let word = account.into_word();
        self.topics.iter().any(|t| *t == word)
    }
}

/// Inclusive block range for log queries. `to = None` means the latest block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockRange {
    pub from: u64,
    pub to: Option<u64>,
}

/// Repayment and liquidation counts for one lending protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtocolStats {
    pub repay_count: u64,
    pub liquidation_count: u64,
}

impl Add for ProtocolStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            repay_count: self.repay_count.saturating_add(rhs.repay_count),
            liquidation_count: self.liquidation_count.saturating_add(rhs.liquidation_count),
        }
    }
}

impl AddAssign for ProtocolStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for ProtocolStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Per-protocol and per-token breakdown kept alongside the factors.
///
/// Diagnostic only: not scored and not part of the commitment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorDetail {
    pub protocols: BTreeMap<String, ProtocolStats>,
    /// Staking token symbol → ETH-equivalent amount.
    pub staking: BTreeMap<String, f64>,
    /// Stablecoin symbol → USD amount.
    pub stablecoins: BTreeMap<String, f64>,
    pub stable_usd: f64,
}

/// The fixed factor set extracted for one wallet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WalletFactors {
    /// In `[0, 1]`.
    pub on_time_repayment_rate: f64,
    /// Liquidations across all protocols.
    pub default_count: u64,
    /// Transactions per day, `>= 0`.
    pub avg_tx_frequency: f64,
    pub avg_balance_usd: f64,
    /// In `[0, 1]`.
    pub stablecoin_ratio: f64,
    /// Reserved; always 0 until credit-line data is available.
    pub debt_utilization: f64,
    pub staking_amount_eth: f64,
    pub staking_tenure_days: u64,
    pub detail: FactorDetail,
}

impl WalletFactors {
    /// The committed factors as `(name, value)` pairs, in declaration order.
    pub fn factor_pairs(&self) -> Vec<(&'static str, FactorValue)> {
        vec![
            (constants::ON_TIME_REPAYMENT_RATE, FactorValue::Float(self.on_time_repayment_rate)),
            (constants::DEFAULT_COUNT, FactorValue::Int(self.default_count)),
            (constants::AVG_TX_FREQUENCY, FactorValue::Float(self.avg_tx_frequency)),
            (constants::AVG_BALANCE_USD, FactorValue::Float(self.avg_balance_usd)),
            (constants::STABLECOIN_RATIO, FactorValue::Float(self.stablecoin_ratio)),
            (constants::DEBT_UTILIZATION, FactorValue::Float(self.debt_utilization)),
            (constants::STAKING_AMOUNT_ETH, FactorValue::Float(self.staking_amount_eth)),
            (constants::STAKING_TENURE_DAYS, FactorValue::Int(self.staking_tenure_days)),
        ]
    }
}

/// A single factor value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorValue {
    Int(u64),
    Float(f64),
}

impl FactorValue {
    /// Reproducible textual form used for commitment leaves.
    ///
    /// Integers render in plain decimal. Floats render fixed-point with
    /// [`CANONICAL_FLOAT_DIGITS`] fractional digits; `-0.0` and non-finite
    /// values render as zero.
    pub fn canonical_string(&self) -> String {
        match *self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => {
                let v = if v.is_finite() && v != 0.0 { v } else { 0.0 };
                format!("{v:.prec$}", prec = CANONICAL_FLOAT_DIGITS)
            }
        }
    }
}

impl fmt::Display for FactorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

/// Credit score in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(MAX_SCORE);

    /// Returns `None` above [`MAX_SCORE`].
    pub fn new(value: u8) -> Option<Self> {
        (value <= MAX_SCORE).then_some(Self(value))
    }

    /// Clamps `value` into range.
    pub fn saturating(value: u8) -> Self {
        Self(value.min(MAX_SCORE))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("score {value} exceeds {MAX_SCORE}"))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> u8 {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 32-byte commitment over a wallet's factor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorsRoot(pub B256);

impl FactorsRoot {
    /// Commitment of the empty factor set.
    pub const ZERO: FactorsRoot = FactorsRoot(B256::ZERO);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl From<B256> for FactorsRoot {
    fn from(hash: B256) -> Self {
        Self(hash)
    }
}

impl fmt::Display for FactorsRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.as_bytes()))
    }
}

/// A signed, time-bounded statement binding a wallet to a score and a commitment.
///
/// Field set matches the verifier's
/// `submit(wallet, score, factorsRoot, validUntil, nonce, signature)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub wallet: Address,
    pub score: Score,
    pub factors_root: FactorsRoot,
    /// Unix seconds after which the attestation is expired.
    pub valid_until: u64,
    pub nonce: U256,
    /// 65-byte `r || s || v` secp256k1 signature.
    pub signature: Bytes,
}

impl Attestation {
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.valid_until
    }
}
