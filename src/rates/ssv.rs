//! Special Surrender Value tiers with per-tier eligibility

use super::table::{RateRow, RateTable, TierOverflow};
use crate::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// SSV band: a rate tier plus the minimum elapsed years before it pays out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsvRow {
    #[serde(alias = "min_duration")]
    pub min: u32,

    #[serde(alias = "max_duration")]
    pub max: u32,

    /// Rate as a percentage of sum assured
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Decimal,

    /// Elapsed years required before this tier is payable
    #[serde(default)]
    pub eligibility_years: u32,
}

impl SsvRow {
    pub fn new(min: u32, max: u32, rate: Decimal, eligibility_years: u32) -> Self {
        Self { min, max, rate, eligibility_years }
    }
}

/// The matched SSV tier for a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsvTier {
    pub rate: Decimal,
    pub eligibility_years: u32,
}

/// Validated SSV configuration for one policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SsvRow>", into = "Vec<SsvRow>")]
pub struct SsvTable {
    rates: RateTable,
    /// Eligibility years, parallel to `rates.rows()`
    eligibility: Vec<u32>,
}

impl SsvTable {
    /// Validate and build an SSV table (same rules as `RateTable::build`,
    /// plus eligibility may not lie beyond its tier)
    pub fn build(mut rows: Vec<SsvRow>) -> Result<Self, ValidationError> {
        for row in &rows {
            if row.eligibility_years > row.max && row.min <= row.max {
                return Err(ValidationError::EligibilityBeyondTier {
                    eligibility_years: row.eligibility_years,
                    max: row.max,
                });
            }
        }

        rows.sort_by_key(|row| row.min);
        let rates = RateTable::build(
            rows.iter().map(|row| RateRow::new(row.min, row.max, row.rate)).collect(),
        )?;
        let eligibility = rows.iter().map(|row| row.eligibility_years).collect();

        Ok(Self { rates, eligibility })
    }

    /// Return a copy of this table using a different overflow policy
    pub fn with_overflow(self, overflow: TierOverflow) -> Self {
        Self {
            rates: self.rates.with_overflow(overflow),
            eligibility: self.eligibility,
        }
    }

    /// Underlying rate tiers
    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Tier matching the elapsed duration
    pub fn lookup(&self, elapsed_years: u32) -> Option<SsvTier> {
        self.rates.tier_index(elapsed_years).map(|idx| SsvTier {
            rate: self.rates.rows()[idx].rate,
            eligibility_years: self.eligibility[idx],
        })
    }
}

impl TryFrom<Vec<SsvRow>> for SsvTable {
    type Error = ValidationError;

    fn try_from(rows: Vec<SsvRow>) -> Result<Self, Self::Error> {
        Self::build(rows)
    }
}

impl From<SsvTable> for Vec<SsvRow> {
    fn from(table: SsvTable) -> Self {
        table
            .rates
            .rows()
            .iter()
            .zip(table.eligibility.iter())
            .map(|(row, &eligibility_years)| {
                SsvRow::new(row.min, row.max, row.rate, eligibility_years)
            })
            .collect()
    }
}
