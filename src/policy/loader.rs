//! Load policy definitions (JSON) and holder books (CSV)

use super::{Policy, PolicyHolder};
use crate::error::LoadError;
use csv::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Load policy definitions from a JSON array, keyed by `policy_code`
///
/// Rate tables are validated while deserializing, so a malformed table
/// fails the whole load.
pub fn load_policies_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<HashMap<String, Policy>, LoadError> {
    let policies: Vec<Policy> = serde_json::from_reader(reader)?;
    Ok(policies
        .into_iter()
        .map(|policy| (policy.policy_code.clone(), policy))
        .collect())
}

/// Load policy definitions from a JSON file
pub fn load_policies<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Policy>, LoadError> {
    load_policies_from_reader(File::open(path)?)
}

/// Load policy holders from any reader
pub fn load_holders_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<PolicyHolder>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut holders = Vec::new();

    for result in csv_reader.deserialize() {
        let holder: PolicyHolder = result?;
        holders.push(holder);
    }

    Ok(holders)
}

/// Load policy holders from a CSV file
pub fn load_holders<P: AsRef<Path>>(path: P) -> Result<Vec<PolicyHolder>, LoadError> {
    load_holders_from_reader(File::open(path)?)
}
