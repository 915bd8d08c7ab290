//! Protocol constants. Contract addresses and event topics are Ethereum mainnet.

use alloy_primitives::{Address, B256, address, b256};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Decimals of native ETH (wei per ETH = 10^18).
pub const ETH_DECIMALS: u8 = 18;

/// Decimals assumed for a token when none is configured.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Largest decimal count whose scale factor still fits a `U256` balance.
pub const MAX_TOKEN_DECIMALS: u8 = 77;

/// ETH/USD price used when the caller supplies none.
pub const DEFAULT_ETH_USD: f64 = 3000.0;

/// Upper bound of the score range.
pub const MAX_SCORE: u8 = 100;

// --- Attestation domain ---

pub const EIP712_DOMAIN_NAME: &str = "CryptoCreditScore";
pub const EIP712_DOMAIN_VERSION: &str = "1";
pub const DEFAULT_CHAIN_ID: u64 = 1;
pub const DEFAULT_VERIFYING_CONTRACT: Address =
    address!("0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC");

/// Attestations expire one hour after signing by default.
pub const DEFAULT_VALIDITY_SECS: u64 = 3_600;

// --- Lending protocols ---

/// Aave v3 Pool.
pub const AAVE_V3_POOL: Address = address!("0x87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2");

/// `LiquidationCall(address,address,address,uint256,uint256,address,bool)`.
pub const AAVE_LIQUIDATION_CALL_TOPIC: B256 =
    b256!("0xe413a321e8681d831f4dbccbca790d2952b56f977908e45be37335533e005286");

/// Compound v2 cDAI market.
pub const COMPOUND_CDAI: Address = address!("0x5d3a536E4D6DbD6114cc1Ead35777bAB948E3643");

/// Compound v2 cUSDC market.
pub const COMPOUND_CUSDC: Address = address!("0x39AA39c021dfbaE8faC545936693aC917d5E7563");

/// `LiquidateBorrow(address,address,uint256,address,uint256)`.
pub const COMPOUND_LIQUIDATE_BORROW_TOPIC: B256 =
    b256!("0xfc6ac64d4248d985f1913f3d1b7a8dde8d52e78a9516642b76b281c5d5dbd2a7");

pub const AAVE_REPAY_MARKERS: &[&str] = &["repay("];
pub const COMPOUND_REPAY_MARKERS: &[&str] = &["repayborrow", "repayborrowbehalf"];

// --- Staking derivatives ---

/// Lido stETH.
pub const STETH: Address = address!("0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84");
/// Rocket Pool rETH.
pub const RETH: Address = address!("0xae78736Cd615f374D3085123A210448E74Fc6393");

// --- Stablecoins (valued at 1 USD) ---

pub const USDT: Address = address!("0xdAC17F958D2ee523a2206206994597C13D831ec7");
pub const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const DAI: Address = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");

// --- Factor keys (commitment leaf names) ---

pub const ON_TIME_REPAYMENT_RATE: &str = "on_time_repayment_rate";
pub const DEFAULT_COUNT: &str = "default_count";
pub const AVG_TX_FREQUENCY: &str = "avg_tx_frequency";
pub const AVG_BALANCE_USD: &str = "avg_balance_usd";
pub const STABLECOIN_RATIO: &str = "stablecoin_ratio";
pub const DEBT_UTILIZATION: &str = "debt_utilization";
pub const STAKING_AMOUNT_ETH: &str = "staking_amount_eth";
pub const STAKING_TENURE_DAYS: &str = "staking_tenure_days";

/// Fractional digits used when rendering float factors for the commitment.
pub const CANONICAL_FLOAT_DIGITS: usize = 9;
