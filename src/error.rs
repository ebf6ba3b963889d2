//! Error types for rate table construction, valuation, and loan accounting

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed rate table rows, rejected at construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rate row [{min}, {max}] has min greater than max")]
    InvertedRange { min: u32, max: u32 },

    #[error("rate row [{min}, {max}] has negative rate {rate}")]
    NegativeRate { min: u32, max: u32, rate: Decimal },

    #[error("rate rows [{}, {}] and [{}, {}] overlap", .first.0, .first.1, .second.0, .second.1)]
    Overlap { first: (u32, u32), second: (u32, u32) },

    #[error("eligibility of {eligibility_years} years lies beyond tier maximum {max}")]
    EligibilityBeyondTier { eligibility_years: u32, max: u32 },
}

/// Failures of a surrender value computation
///
/// `NoApplicableRate` and `NotEligible` are expected business states
/// (the policy is not yet surrenderable), not system faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuationError {
    #[error("valuation date {as_of} precedes issue date {issue_date}")]
    InvalidDate { as_of: NaiveDate, issue_date: NaiveDate },

    #[error("no applicable rate after {elapsed_years} elapsed years")]
    NoApplicableRate { elapsed_years: u32 },

    #[error("not eligible for special surrender value: {elapsed_years} elapsed years, {eligibility_years} required")]
    NotEligible { elapsed_years: u32, eligibility_years: u32 },

    #[error("sum assured {sum_assured} outside policy bounds [{min}, {max}]")]
    SumAssuredOutOfRange { sum_assured: Decimal, min: Decimal, max: Decimal },
}

impl ValuationError {
    /// True for "not yet available" states that must not be shown as errors
    pub fn is_business_state(&self) -> bool {
        matches!(
            self,
            ValuationError::NoApplicableRate { .. } | ValuationError::NotEligible { .. }
        )
    }
}

/// Rejected loan operations
///
/// Repayment rejections carry the attempted amount and the ceiling so the
/// submitting user can correct their input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    #[error("repayment of {attempted} exceeds outstanding balance {ceiling}")]
    ExceedsBalance { attempted: Decimal, ceiling: Decimal },

    #[error("interest repayment of {attempted} exceeds accrued interest {ceiling}")]
    ExceedsInterestDue { attempted: Decimal, ceiling: Decimal },

    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },

    #[error("event date {date} precedes last interest date {last_interest_date}")]
    Backdated { date: NaiveDate, last_interest_date: NaiveDate },

    #[error("interest rate must not be negative, got {rate}")]
    NegativeRate { rate: Decimal },

    #[error("requested loan {requested} exceeds available capacity {capacity}")]
    ExceedsCapacity { requested: Decimal, capacity: Decimal },

    #[error("{field} must not be negative, got {amount}")]
    NegativeBalance { field: &'static str, amount: Decimal },

    #[error("remaining balance {remaining_balance} exceeds loan amount {loan_amount}")]
    BalanceExceedsPrincipal { remaining_balance: Decimal, loan_amount: Decimal },

    #[error("day count basis must be positive")]
    ZeroDayCountBasis,

    #[error(transparent)]
    Valuation(#[from] ValuationError),
}

/// Failures while loading rate tables, policy definitions, or books
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid rate table: {0}")]
    Validation(#[from] ValidationError),

    #[error("holder {policy_number} references unknown policy {policy_ref}")]
    UnknownPolicy { policy_number: String, policy_ref: String },

    #[error("invalid loan {loan_id}: {source}")]
    InvalidLoan { loan_id: String, source: LoanError },

    #[error("invalid config: accrual day_count_basis must be positive")]
    ZeroDayCountBasis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_business_states() {
        assert!(ValuationError::NoApplicableRate { elapsed_years: 1 }.is_business_state());
        let not_eligible = ValuationError::NotEligible { elapsed_years: 1, eligibility_years: 3 };
        assert!(not_eligible.is_business_state());

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(!ValuationError::InvalidDate { as_of: date, issue_date: date }.is_business_state());
    }

    #[test]
    fn test_repayment_error_message_carries_ceiling() {
        let err = LoanError::ExceedsBalance { attempted: dec!(60000), ceiling: dec!(55000) };
        let msg = err.to_string();
        assert!(msg.contains("60000"));
        assert!(msg.contains("55000"));
    }
}
