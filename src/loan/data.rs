//! Loan and repayment records

use crate::error::LoanError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a policy loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Principal or interest still outstanding
    Active,
    /// Terminal: principal and accrued interest both repaid
    Settled,
}

/// How a repayment is allocated between interest and principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentType {
    /// Reduces accrued interest only
    Interest,
    /// Reduces the principal balance only
    Principal,
    /// Accrued interest first, remainder to principal
    Both,
}

/// A loan against a policy's surrender value
///
/// Only the ledger operations (`accrue_interest`, `apply_repayment`) change
/// `accrued_interest`, `remaining_balance`, and `last_interest_date`; the
/// caller persists the returned loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: String,

    /// `policy_number` of the holder the loan is secured on
    pub policy_holder_ref: String,

    /// Amount originally disbursed
    #[serde(with = "rust_decimal::serde::str")]
    pub loan_amount: Decimal,

    /// Annual simple interest rate as a decimal fraction (0.09 = 9%)
    #[serde(with = "rust_decimal::serde::str")]
    pub interest_rate: Decimal,

    pub disbursement_date: NaiveDate,

    /// Date up to which interest has been accrued
    pub last_interest_date: NaiveDate,

    /// Interest accrued and not yet repaid
    #[serde(with = "rust_decimal::serde::str")]
    pub accrued_interest: Decimal,

    /// Principal not yet repaid
    #[serde(with = "rust_decimal::serde::str")]
    pub remaining_balance: Decimal,
}

impl Loan {
    /// Principal plus accrued interest: the most that can be repaid
    pub fn outstanding(&self) -> Decimal {
        self.remaining_balance + self.accrued_interest
    }

    pub fn status(&self) -> LoanStatus {
        if self.remaining_balance.is_zero() && self.accrued_interest.is_zero() {
            LoanStatus::Settled
        } else {
            LoanStatus::Active
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status() == LoanStatus::Settled
    }

    /// Check a loan supplied from persistence before operating on it
    ///
    /// Rejects a negative rate, negative amounts, and a principal balance
    /// above the amount disbursed.
    pub fn validate(&self) -> Result<(), LoanError> {
        if self.interest_rate < Decimal::ZERO {
            return Err(LoanError::NegativeRate { rate: self.interest_rate });
        }

        let amounts = [
            ("loan_amount", self.loan_amount),
            ("remaining_balance", self.remaining_balance),
            ("accrued_interest", self.accrued_interest),
        ];
        let negative = amounts.into_iter().find(|(_, amount)| *amount < Decimal::ZERO);
        if let Some((field, amount)) = negative {
            return Err(LoanError::NegativeBalance { field, amount });
        }

        if self.remaining_balance > self.loan_amount {
            return Err(LoanError::BalanceExceedsPrincipal {
                remaining_balance: self.remaining_balance,
                loan_amount: self.loan_amount,
            });
        }

        Ok(())
    }
}

/// Immutable, append-only record of one repayment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRepayment {
    pub repayment_id: String,
    pub loan_ref: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub repayment_type: RepaymentType,

    /// Portion applied to accrued interest
    pub interest_portion: Decimal,
    /// Portion applied to principal
    pub principal_portion: Decimal,

    /// Principal balance after this repayment
    pub resulting_balance: Decimal,
    /// Accrued interest after this repayment
    pub resulting_accrued_interest: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan() -> Loan {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        Loan {
            loan_id: "L-1".to_string(),
            policy_holder_ref: "PN-1".to_string(),
            loan_amount: dec!(100000),
            interest_rate: dec!(0.09),
            disbursement_date: date,
            last_interest_date: date,
            accrued_interest: dec!(1200),
            remaining_balance: dec!(80000),
        }
    }

    #[test]
    fn test_validate_accepts_active_and_settled() {
        assert_eq!(loan().validate(), Ok(()));

        let settled = Loan {
            accrued_interest: Decimal::ZERO,
            remaining_balance: Decimal::ZERO,
            ..loan()
        };
        assert_eq!(settled.validate(), Ok(()));
        assert!(settled.is_settled());
    }

    #[test]
    fn test_validate_rejects_negative_rate() {
        let loan = Loan { interest_rate: dec!(-0.09), ..loan() };
        assert_eq!(loan.validate(), Err(LoanError::NegativeRate { rate: dec!(-0.09) }));
    }

    #[test]
    fn test_validate_rejects_negative_balances() {
        let loan = Loan {
            accrued_interest: dec!(-500),
            remaining_balance: dec!(-100),
            ..loan()
        };
        assert_eq!(
            loan.validate(),
            Err(LoanError::NegativeBalance { field: "remaining_balance", amount: dec!(-100) })
        );

        let loan = Loan { accrued_interest: dec!(-0.01), ..self::loan() };
        assert_eq!(
            loan.validate(),
            Err(LoanError::NegativeBalance { field: "accrued_interest", amount: dec!(-0.01) })
        );
    }

    #[test]
    fn test_validate_rejects_balance_above_principal() {
        let loan = Loan { remaining_balance: dec!(100000.01), ..loan() };
        assert_eq!(
            loan.validate(),
            Err(LoanError::BalanceExceedsPrincipal {
                remaining_balance: dec!(100000.01),
                loan_amount: dec!(100000),
            })
        );
    }
}
