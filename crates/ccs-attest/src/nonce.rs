//! Replay-protection nonces.
//!
//! Raw wall-clock seconds collide when two attestations are produced in the
//! same second, so [`NonceMode::Random`] is the default.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::U256;
use rand::RngCore;
use serde::{Deserialize, Serialize};

pub trait NonceSource: Send + Sync {
    /// Produce the nonce for an attestation created at `now` (unix seconds).
    fn next_nonce(&self, now: u64) -> U256;
}

/// 128 bits from the OS RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn next_nonce(&self, _now: u64) -> U256 {
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        U256::from(u128::from_be_bytes(bytes))
    }
}

/// Strictly increasing within a process: `max(previous + 1, now)`.
#[derive(Debug, Default)]
pub struct MonotonicNonce {
    last: AtomicU64,
}

impl MonotonicNonce {
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }
}

impl NonceSource for MonotonicNonce {
    fn next_nonce(&self, now: u64) -> U256 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_add(1).max(now);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return U256::from(next),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Unix seconds, unchanged. Kept for compatibility with verifiers that
/// expect time-derived nonces; not unique within a second.
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClockNonce;

impl NonceSource for WallClockNonce {
    fn next_nonce(&self, now: u64) -> U256 {
        U256::from(now)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceMode {
    #[default]
    Random,
    Monotonic,
    WallClock,
}

impl NonceMode {
    pub fn build(self) -> Box<dyn NonceSource> {
        match self {
            NonceMode::Random => Box::new(RandomNonce),
            NonceMode::Monotonic => Box::new(MonotonicNonce::default()),
            NonceMode::WallClock => Box::new(WallClockNonce),
        }
    }
}
