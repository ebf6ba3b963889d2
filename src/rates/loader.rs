//! Load rate tiers from CSV
//!
//! Surrender tables use `min_duration,max_duration,rate` headers (SSV tables add
//! `eligibility_years`); mortality tables use `age_start,age_end,rate`.

use super::{MortalityTable, RateRow, RateTable, SsvRow, SsvTable};
use crate::error::LoadError;
use csv::Reader;
use std::path::Path;

/// Read raw rate rows from any reader
pub fn load_rate_rows_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<RateRow>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: RateRow = result?;
        rows.push(row);
    }

    Ok(rows)
}

/// Read raw SSV rows from any reader
pub fn load_ssv_rows_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<SsvRow>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: SsvRow = result?;
        rows.push(row);
    }

    Ok(rows)
}

/// Load and validate a GSV rate table from a CSV file
pub fn load_rate_table<P: AsRef<Path>>(path: P) -> Result<RateTable, LoadError> {
    let file = std::fs::File::open(path)?;
    Ok(RateTable::build(load_rate_rows_from_reader(file)?)?)
}

/// Load and validate an SSV table from a CSV file
pub fn load_ssv_table<P: AsRef<Path>>(path: P) -> Result<SsvTable, LoadError> {
    let file = std::fs::File::open(path)?;
    Ok(SsvTable::build(load_ssv_rows_from_reader(file)?)?)
}

/// Load and validate an age-banded mortality table from a CSV file
pub fn load_mortality_table<P: AsRef<Path>>(path: P) -> Result<MortalityTable, LoadError> {
    let file = std::fs::File::open(path)?;
    Ok(MortalityTable::build(load_rate_rows_from_reader(file)?)?)
}
