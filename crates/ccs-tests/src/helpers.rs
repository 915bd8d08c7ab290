//! Shared test helpers for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy_primitives::{Address, B256, U256, address};
use async_trait::async_trait;
use ccs_core::constants::{
    AAVE_LIQUIDATION_CALL_TOPIC, AAVE_V3_POOL, COMPOUND_CDAI, COMPOUND_LIQUIDATE_BORROW_TOPIC,
    DAI, RETH, SECONDS_PER_DAY, STETH, USDC, USDT,
};
use ccs_core::error::FetchError;
use ccs_core::traits::DataSource;
use ccs_core::types::{BlockRange, LogRecord, TransactionRecord};

/// Fixed clock for deterministic scenarios.
pub const NOW: u64 = 1_760_000_000;
pub const YEAR: u64 = 365 * SECONDS_PER_DAY;

/// The wallet under test in the reference scenario.
pub const WALLET: Address = address!("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef");

/// `amount * 10^decimals`, for whole or fractional token amounts.
pub fn units(amount: f64, decimals: u8) -> U256 {
    let scaled = (amount * 10f64.powi(i32::from(decimals))).round();
    U256::from(scaled as u128)
}

pub fn tx(hash: &str, timestamp: u64, to: Address, function_name: &str) -> TransactionRecord {
    TransactionRecord {
        hash: hash.to_string(),
        timestamp,
        from: None,
        to: Some(to),
        function_name: function_name.to_string(),
    }
}

pub fn transfer(timestamp: u64, from: Address, to: Address) -> TransactionRecord {
    TransactionRecord {
        hash: format!("0x{timestamp:x}"),
        timestamp,
        from: Some(from),
        to: Some(to),
        function_name: String::new(),
    }
}

/// A liquidation log from `contract` naming each of `accounts` in a topic slot.
pub fn liquidation(contract: Address, topic0: B256, accounts: &[Address]) -> LogRecord {
    let mut topics = vec![topic0];
    topics.extend(accounts.iter().map(|a| a.into_word()));
    LogRecord {
        address: contract,
        topics,
    }
}

/// In-memory explorer with scripted responses and call accounting.
#[derive(Debug, Default)]
pub struct FakeExplorer {
    pub txs: Vec<TransactionRecord>,
    pub logs: HashMap<(Address, B256), Vec<LogRecord>>,
    pub token_balances: HashMap<Address, U256>,
    pub eth_balance: U256,
    /// Every `get_logs` call fails with this error when set.
    pub logs_error: Option<FetchError>,
    pub calls: AtomicUsize,
}

impl FakeExplorer {
    pub fn empty() -> Self {
        Self::default()
    }

    /// One Aave repay, one Aave liquidation, one Compound (cDAI) repay, one
    /// cDAI liquidation, an unrelated transfer, 100 ETH, 1.5 stETH + 0.5 rETH,
    /// and 1000 USDT + 2000 USDC + 500 DAI.
    pub fn reference_scenario() -> Self {
        let mut fake = Self {
            txs: vec![
                tx(
                    "0xaaa",
                    NOW - YEAR,
                    AAVE_V3_POOL,
                    "repay(address asset, uint256 amount, uint256 interestRateMode, address onBehalfOf)",
                ),
                tx(
                    "0xccc",
                    NOW - 1_000,
                    address!("000000000000000000000000000000000000dead"),
                    "transfer(address,uint256)",
                ),
                tx("0xbbb", NOW, COMPOUND_CDAI, "repayBorrow(uint256)"),
            ],
            eth_balance: units(100.0, 18),
            ..Self::default()
        };
        fake.add_log(liquidation(
            AAVE_V3_POOL,
            AAVE_LIQUIDATION_CALL_TOPIC,
            &[Address::with_last_byte(1), Address::with_last_byte(2), WALLET],
        ));
        fake.add_log(liquidation(
            COMPOUND_CDAI,
            COMPOUND_LIQUIDATE_BORROW_TOPIC,
            &[Address::with_last_byte(3), WALLET],
        ));
        fake.token_balances.insert(STETH, units(1.5, 18));
        fake.token_balances.insert(RETH, units(0.5, 18));
        fake.token_balances.insert(USDT, units(1_000.0, 6));
        fake.token_balances.insert(USDC, units(2_000.0, 6));
        fake.token_balances.insert(DAI, units(500.0, 18));
        fake
    }

    pub fn add_log(&mut self, log: LogRecord) {
        let key = (log.address, log.topics.first().copied().unwrap_or_default());
        self.logs.entry(key).or_default().push(log);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataSource for FakeExplorer {
    async fn list_transactions(
        &self,
        _address: &Address,
    ) -> Result<Vec<TransactionRecord>, FetchError> {
        self.tick();
        // Scripted history belongs to the wallet under test.
        let mut txs = self.txs.clone();
        txs.sort_by_key(|t| t.timestamp);
        Ok(txs)
    }

    async fn get_logs(
        &self,
        contract: &Address,
        topic0: &B256,
        _range: BlockRange,
    ) -> Result<Vec<LogRecord>, FetchError> {
        self.tick();
        if let Some(err) = &self.logs_error {
            return Err(err.clone());
        }
        Ok(self.logs.get(&(*contract, *topic0)).cloned().unwrap_or_default())
    }

    async fn get_token_balance(
        &self,
        token: &Address,
        _holder: &Address,
    ) -> Result<U256, FetchError> {
        self.tick();
        Ok(self.token_balances.get(token).copied().unwrap_or_default())
    }

    async fn get_eth_balance(&self, _address: &Address) -> Result<U256, FetchError> {
        self.tick();
        Ok(self.eth_balance)
    }
}
