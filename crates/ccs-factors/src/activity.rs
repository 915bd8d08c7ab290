//! Activity frequency and staking tenure over a transaction history.

use alloy_primitives::Address;
use ccs_core::constants::SECONDS_PER_DAY;
use ccs_core::types::TransactionRecord;

/// Transactions per day: `count / max(1, (last_ts - first_ts) / 86400)`.
///
/// `txs` must be ascending by timestamp. Returns exactly 0 for an empty history.
pub fn activity_frequency(txs: &[TransactionRecord]) -> f64 {
    let (Some(first), Some(last)) = (txs.first(), txs.last()) else {
        return 0.0;
    };
    let span_secs = last.timestamp.saturating_sub(first.timestamp);
    let days = (span_secs as f64 / SECONDS_PER_DAY as f64).max(1.0);
    txs.len() as f64 / days
}

/// Whole days the wallet has held its position since the last inbound transfer.
///
/// Scans the ascending history for the latest inbound (`to == wallet`) and
/// latest outbound (`from == wallet`) timestamps:
/// - no inbound ever: 0
/// - outbound strictly after inbound: position exited, 0
/// - otherwise: `floor((now - last_inbound) / 86400)`
pub fn staking_tenure_days(txs: &[TransactionRecord], wallet: &Address, now: u64) -> u64 {
    let mut last_inbound: Option<u64> = None;
    let mut last_outbound: Option<u64> = None;

    for tx in txs {
        if tx.to.as_ref() == Some(wallet) {
            last_inbound = Some(last_inbound.map_or(tx.timestamp, |t| t.max(tx.timestamp)));
        }
        if tx.from.as_ref() == Some(wallet) {
            last_outbound = Some(last_outbound.map_or(tx.timestamp, |t| t.max(tx.timestamp)));
        }
    }

    let Some(inbound) = last_inbound else {
        return 0;
    };
    if last_outbound.is_some_and(|out| out > inbound) {
        return 0;
    }
    now.saturating_sub(inbound) / SECONDS_PER_DAY
}
