//! Policy definitions and policy holder records

use crate::error::ValuationError;
use crate::rates::{RateTable, SsvTable, TierOverflow};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product family of a policy definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyType {
    Endowment,
    WholeLife,
    MoneyBack,
    Term,
}

/// Lifecycle status of a holder's policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyStatus {
    #[default]
    InForce,
    Lapsed,
    Surrendered,
    Matured,
}

/// A policy definition, created by configuration and read-only to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Unique product code, referenced by holders
    pub policy_code: String,

    pub policy_type: PolicyType,

    /// Lowest sum assured the product may be sold with
    pub min_sum_assured: Decimal,

    /// Highest sum assured the product may be sold with
    pub max_sum_assured: Decimal,

    #[serde(default = "default_multiplier")]
    pub base_multiplier: Decimal,

    /// Guaranteed annual interest rate (percentage)
    #[serde(default)]
    pub guaranteed_interest_rate: Decimal,

    /// Terminal bonus rate (percentage)
    #[serde(default)]
    pub terminal_bonus_rate: Decimal,

    /// Accidental Death Benefit rider
    #[serde(default)]
    pub include_adb: bool,
    #[serde(default)]
    pub adb_percentage: Decimal,

    /// Permanent Total Disability rider
    #[serde(default)]
    pub include_ptd: bool,
    #[serde(default)]
    pub ptd_percentage: Decimal,

    /// GSV rates by elapsed policy years
    pub gsv_rates: RateTable,

    /// SSV rates and eligibility by elapsed policy years
    #[serde(default)]
    pub ssv_configs: SsvTable,
}

fn default_multiplier() -> Decimal {
    Decimal::ONE
}

/// Rider cover amounts for a holder (present only when the rider is included)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderCover {
    pub adb: Option<Decimal>,
    pub ptd: Option<Decimal>,
}

impl Policy {
    /// Create a policy with open sum-assured bounds and no riders
    pub fn new(
        policy_code: impl Into<String>,
        policy_type: PolicyType,
        gsv_rates: RateTable,
        ssv_configs: SsvTable,
    ) -> Self {
        Self {
            policy_code: policy_code.into(),
            policy_type,
            min_sum_assured: Decimal::ZERO,
            max_sum_assured: Decimal::MAX,
            base_multiplier: default_multiplier(),
            guaranteed_interest_rate: Decimal::ZERO,
            terminal_bonus_rate: Decimal::ZERO,
            include_adb: false,
            adb_percentage: Decimal::ZERO,
            include_ptd: false,
            ptd_percentage: Decimal::ZERO,
            gsv_rates,
            ssv_configs,
        }
    }

    /// Return a copy whose GSV and SSV tables use the given overflow policy
    pub fn with_tier_overflow(mut self, overflow: TierOverflow) -> Self {
        self.gsv_rates = self.gsv_rates.with_overflow(overflow);
        self.ssv_configs = self.ssv_configs.with_overflow(overflow);
        self
    }

    /// Check the holder's sum assured against the product bounds
    pub fn check_sum_assured(&self, holder: &PolicyHolder) -> Result<(), ValuationError> {
        if holder.sum_assured < self.min_sum_assured || holder.sum_assured > self.max_sum_assured {
            return Err(ValuationError::SumAssuredOutOfRange {
                sum_assured: holder.sum_assured,
                min: self.min_sum_assured,
                max: self.max_sum_assured,
            });
        }
        Ok(())
    }

    /// ADB and PTD cover as percentages of the holder's sum assured
    pub fn rider_cover(&self, holder: &PolicyHolder) -> RiderCover {
        let cover = |included: bool, pct: Decimal| {
            included.then(|| holder.sum_assured * pct / Decimal::ONE_HUNDRED)
        };
        RiderCover {
            adb: cover(self.include_adb, self.adb_percentage),
            ptd: cover(self.include_ptd, self.ptd_percentage),
        }
    }
}

/// A customer's holding of a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyHolder {
    pub policy_number: String,
    pub customer_ref: String,
    /// `policy_code` of the policy definition
    pub policy_ref: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub sum_assured: Decimal,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub status: PolicyStatus,
}

impl PolicyHolder {
    /// Whole policy years elapsed between issue and `as_of`
    ///
    /// An anniversary counts once its month and day are reached; a 29 February
    /// issue reaches its anniversary on 1 March in non-leap years.
    pub fn elapsed_years(&self, as_of: NaiveDate) -> Result<u32, ValuationError> {
        elapsed_years(self.issue_date, as_of)
    }
}

/// Whole years between two dates, failing if `as_of` precedes `issue_date`
pub fn elapsed_years(issue_date: NaiveDate, as_of: NaiveDate) -> Result<u32, ValuationError> {
    if as_of < issue_date {
        return Err(ValuationError::InvalidDate { as_of, issue_date });
    }

    let mut years = as_of.year() - issue_date.year();
    if (as_of.month(), as_of.day()) < (issue_date.month(), issue_date.day()) {
        years -= 1;
    }
    Ok(years as u32)
}
