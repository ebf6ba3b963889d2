//! Engine configuration
//!
//! Loaded from JSON with per-field defaults, so a partial file (or none at all)
//! yields a working configuration.

use crate::error::LoadError;
use crate::rates::TierOverflow;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

fn default_day_count_basis() -> u32 {
    365
}

fn default_money_scale() -> u32 {
    2
}

fn default_loan_capacity_pct() -> Decimal {
    dec!(90)
}

/// Day count and rounding for loan interest accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualConvention {
    /// Days per year in the simple interest fraction; must be positive
    #[serde(default = "default_day_count_basis")]
    pub day_count_basis: u32,

    /// Decimal places each accrued amount is rounded to
    #[serde(default = "default_money_scale")]
    pub money_scale: u32,
}

impl Default for AccrualConvention {
    fn default() -> Self {
        Self {
            day_count_basis: default_day_count_basis(),
            money_scale: default_money_scale(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Behaviour for durations beyond the last rate tier
    #[serde(default)]
    pub tier_overflow: TierOverflow,

    /// Loan interest accrual convention
    #[serde(default)]
    pub accrual: AccrualConvention,

    /// Percentage of surrender value available as loan capacity
    #[serde(default = "default_loan_capacity_pct")]
    pub loan_capacity_pct: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tier_overflow: TierOverflow::default(),
            accrual: AccrualConvention::default(),
            loan_capacity_pct: default_loan_capacity_pct(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        Self::from_json_reader(file)
    }

    /// Load configuration from any reader
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self, LoadError> {
        let config: Self = serde_json::from_reader(reader)?;
        if config.accrual.day_count_basis == 0 {
            return Err(LoadError::ZeroDayCountBasis);
        }
        Ok(config)
    }
}
