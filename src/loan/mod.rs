//! Policy loan accounting: accrual, repayment allocation, and the repayment ledger

mod data;
mod ledger;
pub mod loader;

pub use data::{Loan, LoanStatus, LoanRepayment, RepaymentType};
pub use ledger::{LoanLedger, LedgerSummary, max_loan_capacity};
pub use loader::{load_loan_json, load_loan_json_from_reader, load_loans, load_loans_from_reader};
