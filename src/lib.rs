//! Policy Valuation - surrender value and policy loan accounting engine
//!
//! This library provides:
//! - Tiered rate tables (GSV, SSV, mortality) with validated, non-overlapping bands
//! - Guaranteed and Special Surrender Value computation by policy duration
//! - Policy loan interest accrual and repayment allocation with an append-only ledger
//! - Read-side valuation reports (net surrender value, available loan capacity)
//!
//! All operations are pure functions over plain data. Fetching rate tables and
//! persisting updated loans is the caller's responsibility.

pub mod error;
pub mod config;
pub mod rates;
pub mod policy;
pub mod valuation;
pub mod loan;
pub mod report;

// Re-export commonly used types
pub use error::{ValidationError, ValuationError, LoanError, LoadError};
pub use config::{EngineConfig, AccrualConvention};
pub use rates::{RateRow, RateTable, TierOverflow, SsvRow, SsvTable, MortalityTable};
pub use policy::{Policy, PolicyHolder, PolicyStatus, PolicyType};
pub use valuation::{compute_gsv, compute_ssv, compute_net_value, GsvResult, SsvResult, NetValue};
pub use loan::{Loan, LoanStatus, LoanLedger, LoanRepayment, RepaymentType};
pub use report::{ValuationReport, ValuationRunner};
