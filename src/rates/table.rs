//! Tiered rate tables keyed by policy duration or attained age

use crate::error::ValidationError;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Behaviour when a lookup key lies above every tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierOverflow {
    /// Use the rate of the highest tier (maturing policies keep their last rate)
    #[default]
    ClampToHighest,
    /// Report no rate at all
    NoValue,
}

/// A single `[min, max] -> rate` band
///
/// Accepts `min_duration`/`max_duration` (surrender tables) and
/// `age_start`/`age_end` (mortality tables) as field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRow {
    #[serde(alias = "min_duration", alias = "age_start")]
    pub min: u32,

    #[serde(alias = "max_duration", alias = "age_end")]
    pub max: u32,

    /// Rate as a percentage (35 = 35%)
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Decimal,
}

impl RateRow {
    pub fn new(min: u32, max: u32, rate: Decimal) -> Self {
        Self { min, max, rate }
    }

    /// Whether `key` falls inside this band (both ends inclusive)
    pub fn contains(&self, key: u32) -> bool {
        key >= self.min && key <= self.max
    }
}

/// Immutable, validated collection of non-overlapping rate tiers
///
/// Rows are held in ascending order of `min`. Edits produce a new table;
/// a constructed table can be shared freely across threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RateRow>", into = "Vec<RateRow>")]
pub struct RateTable {
    rows: Vec<RateRow>,
    overflow: TierOverflow,
}

impl RateTable {
    /// Validate and build a table with the default clamp-to-highest-tier overflow
    ///
    /// Rows may be supplied in any order. Rejects inverted ranges, negative
    /// rates, and any pair of rows whose ranges overlap.
    pub fn build(mut rows: Vec<RateRow>) -> Result<Self, ValidationError> {
        for row in &rows {
            if row.min > row.max {
                return Err(ValidationError::InvertedRange { min: row.min, max: row.max });
            }
            if row.rate < Decimal::ZERO {
                return Err(ValidationError::NegativeRate {
                    min: row.min,
                    max: row.max,
                    rate: row.rate,
                });
            }
        }

        rows.sort_by_key(|row| row.min);

        for pair in rows.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if upper.min <= lower.max {
                return Err(ValidationError::Overlap {
                    first: (lower.min, lower.max),
                    second: (upper.min, upper.max),
                });
            }
        }

        Ok(Self {
            rows,
            overflow: TierOverflow::default(),
        })
    }

    /// Return a copy of this table using a different overflow policy
    pub fn with_overflow(mut self, overflow: TierOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn overflow(&self) -> TierOverflow {
        self.overflow
    }

    /// Rows in ascending order of `min`
    pub fn rows(&self) -> &[RateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The tier with the largest range
    pub fn highest_tier(&self) -> Option<&RateRow> {
        self.rows.last()
    }

    /// Index of the tier matching `key`, honouring the overflow policy
    pub(crate) fn tier_index(&self, key: u32) -> Option<usize> {
        // Number of rows starting at or below the key
        let candidates = self.rows.partition_point(|row| row.min <= key);
        if candidates == 0 {
            return None;
        }

        let idx = candidates - 1;
        if self.rows[idx].contains(key) {
            return Some(idx);
        }

        // Key is past this row: either in a gap or above every tier
        if idx == self.rows.len() - 1 {
            match self.overflow {
                TierOverflow::ClampToHighest => {
                    let top = &self.rows[idx];
                    debug!("key {} above highest tier [{}, {}], clamping", key, top.min, top.max);
                    Some(idx)
                }
                TierOverflow::NoValue => None,
            }
        } else {
            None
        }
    }

    /// The tier row matching `key`
    pub fn tier_for(&self, key: u32) -> Option<&RateRow> {
        self.tier_index(key).map(|idx| &self.rows[idx])
    }

    /// Rate of the tier matching `key`
    ///
    /// Keys below every tier (or falling into a gap between tiers) have no
    /// rate. Keys above every tier follow the table's overflow policy.
    pub fn lookup(&self, key: u32) -> Option<Decimal> {
        self.tier_for(key).map(|row| row.rate)
    }
}

impl Default for RateTable {
    /// An empty table: every lookup has no rate
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            overflow: TierOverflow::default(),
        }
    }
}

impl TryFrom<Vec<RateRow>> for RateTable {
    type Error = ValidationError;

    fn try_from(rows: Vec<RateRow>) -> Result<Self, Self::Error> {
        Self::build(rows)
    }
}

impl From<RateTable> for Vec<RateRow> {
    fn from(table: RateTable) -> Self {
        table.rows
    }
}
