//! Explorer response handling.
//!
//! Every response is an envelope `{status, message, result}`. Status `"1"`
//! carries data. Status `"0"` is overloaded: it means "no results" for list
//! queries, and also reports rate limiting and rejected parameters. Those
//! two are surfaced as errors; only the "no results" case becomes empty.
//!
//! Individual records are parsed tolerantly: a record that cannot be used
//! is logged and skipped instead of failing the whole query.

use alloy_primitives::{Address, B256, U256};
use ccs_core::error::{FetchError, RecordError};
use ccs_core::types::{LogRecord, TransactionRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

/// Interpreted envelope payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Items(Vec<Value>),
    Scalar(String),
    Empty,
}

impl Payload {
    pub fn into_items(self) -> Result<Vec<Value>, FetchError> {
        match self {
            Payload::Items(items) => Ok(items),
            Payload::Empty => Ok(Vec::new()),
            Payload::Scalar(s) => Err(FetchError::MalformedEnvelope(format!(
                "expected a list, got {s:?}"
            ))),
        }
    }
}

fn is_rate_limit(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("rate limit") || lower.contains("max calls per sec")
}

fn is_no_results(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.starts_with("no ") && lower.contains("found")
}

pub fn interpret(env: Envelope) -> Result<Payload, FetchError> {
    match env.status.as_str() {
        "1" => match env.result {
            Value::Array(items) => Ok(Payload::Items(items)),
            Value::String(s) => Ok(Payload::Scalar(s)),
            Value::Null => Ok(Payload::Empty),
            other => Err(FetchError::MalformedEnvelope(format!("unexpected result {other}"))),
        },
        "0" => {
            let detail = match &env.result {
                Value::String(s) => s.clone(),
                _ => String::new(),
            };
            if is_rate_limit(&detail) || is_rate_limit(&env.message) {
                return Err(FetchError::RateLimited(if detail.is_empty() {
                    env.message
                } else {
                    detail
                }));
            }
            match env.result {
                Value::Array(items) => Ok(Payload::Items(items)),
                Value::Null => Ok(Payload::Empty),
                // tokenbalance reports a zero holding as status 0, result "0"
                Value::String(s) if s.trim().chars().all(|c| c.is_ascii_digit()) && !s.trim().is_empty() => {
                    Ok(Payload::Scalar(s))
                }
                _ if is_no_results(&env.message) || is_no_results(&detail) => Ok(Payload::Empty),
                _ => Err(FetchError::Rejected(if detail.is_empty() {
                    env.message
                } else {
                    detail
                })),
            }
        }
        other => Err(FetchError::MalformedEnvelope(format!("unknown status {other:?}"))),
    }
}

// --- field helpers ---

fn str_field<'a>(item: &'a Value, field: &'static str) -> Option<&'a str> {
    item.get(field).and_then(Value::as_str)
}

fn parse_address(raw: &str) -> Result<Address, RecordError> {
    raw.parse::<Address>()
        .map_err(|_| RecordError::InvalidAddress(raw.to_string()))
}

/// Empty or absent address fields (contract creation) map to `None`.
fn optional_address(item: &Value, field: &'static str) -> Result<Option<Address>, RecordError> {
    match str_field(item, field).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_address(raw).map(Some),
    }
}

fn parse_u64(raw: &str, field: &'static str) -> Result<u64, RecordError> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse::<u64>(),
    };
    parsed.map_err(|_| RecordError::NotNumeric {
        field,
        value: raw.to_string(),
    })
}

// --- records ---

pub fn parse_transaction(item: &Value) -> Result<TransactionRecord, RecordError> {
    let timestamp = str_field(item, "timeStamp").ok_or(RecordError::MissingField("timeStamp"))?;
    Ok(TransactionRecord {
        hash: str_field(item, "hash").unwrap_or_default().to_string(),
        timestamp: parse_u64(timestamp, "timeStamp")?,
        from: optional_address(item, "from")?,
        to: optional_address(item, "to")?,
        function_name: str_field(item, "functionName").unwrap_or_default().to_string(),
    })
}

pub fn parse_log(item: &Value) -> Result<LogRecord, RecordError> {
    let address = str_field(item, "address").ok_or(RecordError::MissingField("address"))?;
    let topics = item
        .get("topics")
        .and_then(Value::as_array)
        .ok_or(RecordError::MissingField("topics"))?
        .iter()
        .filter_map(Value::as_str)
        .map(|t| {
            t.parse::<B256>()
                .map_err(|_| RecordError::InvalidTopic(t.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LogRecord {
        address: parse_address(address)?,
        topics,
    })
}

/// Decimal balance string. Non-numeric values count as zero.
pub fn parse_balance(raw: &str) -> U256 {
    match U256::from_str_radix(raw.trim(), 10) {
        Ok(v) => v,
        Err(_) => {
            let err = RecordError::NotNumeric {
                field: "balance",
                value: raw.to_string(),
            };
            warn!(error = %err, "treating balance as zero");
            U256::ZERO
        }
    }
}

pub fn balance_from(payload: Payload) -> U256 {
    match payload {
        Payload::Scalar(s) => parse_balance(&s),
        Payload::Empty | Payload::Items(_) => U256::ZERO,
    }
}

/// Parse each item with `parse`, skipping (and logging) unusable ones.
pub fn parse_all<T>(
    kind: &'static str,
    items: &[Value],
    parse: impl Fn(&Value) -> Result<T, RecordError>,
) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| match parse(item) {
            Ok(rec) => Some(rec),
            Err(err) => {
                warn!(kind, error = %err, "skipping malformed record");
                None
            }
        })
        .collect()
}
