//! Mortality rates banded by attained age
//!
//! Bands come from a pre-generated table; this module only consumes them.

use super::table::{RateRow, RateTable, TierOverflow};
use crate::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Age-banded mortality table
///
/// Ages above the oldest band use the oldest band's rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RateRow>", into = "Vec<RateRow>")]
pub struct MortalityTable {
    bands: RateTable,
}

impl MortalityTable {
    pub fn build(rows: Vec<RateRow>) -> Result<Self, ValidationError> {
        Ok(Self {
            bands: RateTable::build(rows)?.with_overflow(TierOverflow::ClampToHighest),
        })
    }

    /// Rate for an attained age, `None` below the youngest band or inside a gap
    pub fn rate_for_age(&self, age: u32) -> Option<Decimal> {
        self.bands.lookup(age)
    }

    pub fn bands(&self) -> &RateTable {
        &self.bands
    }
}

impl TryFrom<Vec<RateRow>> for MortalityTable {
    type Error = ValidationError;

    fn try_from(rows: Vec<RateRow>) -> Result<Self, Self::Error> {
        Self::build(rows)
    }
}

impl From<MortalityTable> for Vec<RateRow> {
    fn from(table: MortalityTable) -> Self {
        table.bands.into()
    }
}
