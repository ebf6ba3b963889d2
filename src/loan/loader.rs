//! Load loan books (CSV) and single loans (JSON)

use super::Loan;
use crate::error::LoadError;
use csv::Reader;
use log::warn;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

fn checked(loan: Loan) -> Result<Loan, LoadError> {
    match loan.validate() {
        Ok(()) => Ok(loan),
        Err(source) => Err(LoadError::InvalidLoan { loan_id: loan.loan_id, source }),
    }
}

/// Load loans from any reader, keyed by `policy_holder_ref`
///
/// A holder carries at most one active loan; later rows for the same holder
/// replace earlier ones. Every loan must pass `Loan::validate`.
pub fn load_loans_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<HashMap<String, Loan>, LoadError> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut loans = HashMap::new();

    for result in csv_reader.deserialize() {
        let loan = checked(result?)?;
        if let Some(previous) = loans.insert(loan.policy_holder_ref.clone(), loan) {
            warn!(
                "holder {} has more than one loan, replacing {}",
                previous.policy_holder_ref, previous.loan_id
            );
        }
    }

    Ok(loans)
}

/// Load a loan book from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Loan>, LoadError> {
    load_loans_from_reader(File::open(path)?)
}

/// Load a single loan from any JSON reader
pub fn load_loan_json_from_reader<R: std::io::Read>(reader: R) -> Result<Loan, LoadError> {
    checked(serde_json::from_reader(reader)?)
}

/// Load a single loan from a JSON file
pub fn load_loan_json<P: AsRef<Path>>(path: P) -> Result<Loan, LoadError> {
    load_loan_json_from_reader(File::open(path)?)
}
