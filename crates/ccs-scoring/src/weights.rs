//! Factor weight table.

use ccs_core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Total every valid weight table sums to.
pub const WEIGHT_TOTAL: u32 = 100;

/// Points available to each factor. Must sum to [`WEIGHT_TOTAL`].
///
/// `default_count` is counted in the total but its contribution is a
/// fixed schedule (see [`crate::engine::default_points`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightTable {
    pub on_time_repayment_rate: u32,
    pub default_count: u32,
    pub avg_tx_frequency: u32,
    pub avg_balance_usd: u32,
    pub stablecoin_ratio: u32,
    pub debt_utilization: u32,
    pub staking_amount_eth: u32,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            on_time_repayment_rate: 25,
            default_count: 25,
            avg_tx_frequency: 10,
            avg_balance_usd: 10,
            stablecoin_ratio: 10,
            debt_utilization: 10,
            staking_amount_eth: 10,
        }
    }
}

impl WeightTable {
    pub fn total(&self) -> u32 {
        [
            self.on_time_repayment_rate,
            self.default_count,
            self.avg_tx_frequency,
            self.avg_balance_usd,
            self.stablecoin_ratio,
            self.debt_utilization,
            self.staking_amount_eth,
        ]
        .iter()
        .fold(0u32, |acc, w| acc.saturating_add(*w))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.total() {
            WEIGHT_TOTAL => Ok(()),
            other => Err(ConfigError::WeightSum(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sums_to_100() {
        assert_eq!(WeightTable::default().total(), WEIGHT_TOTAL);
        WeightTable::default().validate().unwrap();
    }

    #[test]
    fn unbalanced_table_rejected() {
        let w = WeightTable {
            staking_amount_eth: 0,
            ..WeightTable::default()
        };
        assert_eq!(w.validate(), Err(ConfigError::WeightSum(90)));
    }

    #[test]
    fn overflow_saturates_and_is_rejected() {
        let w = WeightTable {
            debt_utilization: u32::MAX,
            ..WeightTable::default()
        };
        assert_eq!(w.validate(), Err(ConfigError::WeightSum(u32::MAX)));
    }

    #[test]
    fn rebalanced_table_accepted() {
        let w = WeightTable {
            debt_utilization: 0,
            staking_amount_eth: 20,
            ..WeightTable::default()
        };
        w.validate().unwrap();
    }
}
