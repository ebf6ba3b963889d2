//! Loan interest accrual and repayment allocation
//!
//! Interest is simple and non-compounding: each interval accrues
//! `remaining_balance * interest_rate * days / day_count_basis`, and accrued
//! interest is never folded into principal.
//!
//! Operations on `Loan` return a new loan and leave the input untouched.
//! `LoanLedger` wraps one loan with its repayment log and commits an operation
//! only when it succeeds. Callers must serialize operations per loan.

use super::data::{Loan, LoanRepayment, LoanStatus, RepaymentType};
use crate::config::AccrualConvention;
use crate::error::{LoanError, ValuationError};
use crate::policy::{Policy, PolicyHolder};
use crate::valuation::surrender_value;
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Maximum loan that may be issued against a holder's surrender value
///
/// `surrender_value * percentage / 100`. This is a read-only check to run
/// before creating a loan (see `Loan::disburse`).
pub fn max_loan_capacity(
    policy: &Policy,
    holder: &PolicyHolder,
    percentage: Decimal,
    as_of: NaiveDate,
) -> Result<Decimal, ValuationError> {
    let value = surrender_value(policy, holder, as_of)?;
    Ok(value * percentage / Decimal::ONE_HUNDRED)
}

impl Loan {
    /// Create an active loan, rejecting amounts above `capacity`
    pub fn disburse(
        loan_id: impl Into<String>,
        policy_holder_ref: impl Into<String>,
        amount: Decimal,
        interest_rate: Decimal,
        date: NaiveDate,
        capacity: Decimal,
    ) -> Result<Self, LoanError> {
        if amount <= Decimal::ZERO {
            return Err(LoanError::NonPositiveAmount { amount });
        }
        if interest_rate < Decimal::ZERO {
            return Err(LoanError::NegativeRate { rate: interest_rate });
        }
        if amount > capacity {
            return Err(LoanError::ExceedsCapacity { requested: amount, capacity });
        }

        let loan = Self {
            loan_id: loan_id.into(),
            policy_holder_ref: policy_holder_ref.into(),
            loan_amount: amount,
            interest_rate,
            disbursement_date: date,
            last_interest_date: date,
            accrued_interest: Decimal::ZERO,
            remaining_balance: amount,
        };
        info!(
            "loan {} disbursed on {}: {} at {}",
            loan.loan_id, date, amount, interest_rate
        );
        Ok(loan)
    }

    /// Interest on the current principal for `days`, rounded per the convention
    pub fn interest_for_days(
        &self,
        days: i64,
        convention: &AccrualConvention,
    ) -> Result<Decimal, LoanError> {
        if convention.day_count_basis == 0 {
            return Err(LoanError::ZeroDayCountBasis);
        }
        let raw = self.remaining_balance * self.interest_rate * Decimal::from(days)
            / Decimal::from(convention.day_count_basis);
        Ok(raw.round_dp_with_strategy(
            convention.money_scale,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }

    /// Accrue interest up to `as_of` using the default 365-day convention
    pub fn accrue_interest(&self, as_of: NaiveDate) -> Result<Loan, LoanError> {
        self.accrue_interest_with(as_of, &AccrualConvention::default())
    }

    /// Accrue interest from `last_interest_date` up to `as_of`
    ///
    /// Calling again with the same `as_of` is a no-op. Dates before
    /// `last_interest_date` are rejected, as is a loan that fails
    /// `Loan::validate`.
    pub fn accrue_interest_with(
        &self,
        as_of: NaiveDate,
        convention: &AccrualConvention,
    ) -> Result<Loan, LoanError> {
        self.validate()?;
        if as_of < self.last_interest_date {
            return Err(LoanError::Backdated {
                date: as_of,
                last_interest_date: self.last_interest_date,
            });
        }

        let days = (as_of - self.last_interest_date).num_days();
        let interest = self.interest_for_days(days, convention)?;
        debug!(
            "loan {}: {} days from {} to {}, interest {}",
            self.loan_id, days, self.last_interest_date, as_of, interest
        );

        let mut next = self.clone();
        next.accrued_interest += interest;
        next.last_interest_date = as_of;
        Ok(next)
    }

    /// Allocate a repayment and return the updated loan with its ledger entry
    ///
    /// The total can never exceed `remaining_balance + accrued_interest`.
    /// `Interest` repayments are capped at the accrued interest and
    /// `Principal` repayments at the remaining balance.
    pub fn apply_repayment(
        &self,
        repayment_id: impl Into<String>,
        date: NaiveDate,
        amount: Decimal,
        repayment_type: RepaymentType,
    ) -> Result<(Loan, LoanRepayment), LoanError> {
        self.validate()?;
        if amount <= Decimal::ZERO {
            return Err(LoanError::NonPositiveAmount { amount });
        }
        if date < self.last_interest_date {
            return Err(LoanError::Backdated {
                date,
                last_interest_date: self.last_interest_date,
            });
        }

        let ceiling = self.outstanding();
        if amount > ceiling {
            return Err(LoanError::ExceedsBalance { attempted: amount, ceiling });
        }

        let (interest_portion, principal_portion) = match repayment_type {
            RepaymentType::Interest => {
                if amount > self.accrued_interest {
                    return Err(LoanError::ExceedsInterestDue {
                        attempted: amount,
                        ceiling: self.accrued_interest,
                    });
                }
                (amount, Decimal::ZERO)
            }
            RepaymentType::Principal => {
                if amount > self.remaining_balance {
                    return Err(LoanError::ExceedsBalance {
                        attempted: amount,
                        ceiling: self.remaining_balance,
                    });
                }
                (Decimal::ZERO, amount)
            }
            RepaymentType::Both => {
                let interest = amount.min(self.accrued_interest);
                (interest, amount - interest)
            }
        };

        let mut next = self.clone();
        next.accrued_interest -= interest_portion;
        next.remaining_balance -= principal_portion;

        let repayment = LoanRepayment {
            repayment_id: repayment_id.into(),
            loan_ref: self.loan_id.clone(),
            date,
            amount,
            repayment_type,
            interest_portion,
            principal_portion,
            resulting_balance: next.remaining_balance,
            resulting_accrued_interest: next.accrued_interest,
        };

        info!(
            "loan {}: repayment {} of {} ({:?}), balance {} interest {}",
            next.loan_id,
            repayment.repayment_id,
            amount,
            repayment_type,
            next.remaining_balance,
            next.accrued_interest
        );
        if next.is_settled() {
            info!("loan {} settled on {}", next.loan_id, date);
        }

        Ok((next, repayment))
    }
}

/// Totals over a ledger's repayment history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub loan_id: String,
    pub status: LoanStatus,
    pub repayment_count: usize,
    pub principal_repaid: Decimal,
    pub interest_repaid: Decimal,
    pub outstanding: Decimal,
}

/// One loan together with its append-only repayment log
#[derive(Debug, Clone)]
pub struct LoanLedger {
    loan: Loan,
    repayments: Vec<LoanRepayment>,
    convention: AccrualConvention,
}

impl LoanLedger {
    pub fn new(loan: Loan) -> Self {
        Self::with_convention(loan, AccrualConvention::default())
    }

    pub fn with_convention(loan: Loan, convention: AccrualConvention) -> Self {
        Self {
            loan,
            repayments: Vec::new(),
            convention,
        }
    }

    /// Resume a ledger from a persisted loan and its repayment history
    pub fn resume(
        loan: Loan,
        repayments: Vec<LoanRepayment>,
        convention: AccrualConvention,
    ) -> Self {
        Self { loan, repayments, convention }
    }

    pub fn loan(&self) -> &Loan {
        &self.loan
    }

    pub fn repayments(&self) -> &[LoanRepayment] {
        &self.repayments
    }

    pub fn status(&self) -> LoanStatus {
        self.loan.status()
    }

    /// Accrue interest up to `as_of`, returning the amount added
    pub fn accrue_to(&mut self, as_of: NaiveDate) -> Result<Decimal, LoanError> {
        let next = self.loan.accrue_interest_with(as_of, &self.convention)?;
        let added = next.accrued_interest - self.loan.accrued_interest;
        self.loan = next;
        Ok(added)
    }

    /// Accrue to `date`, then apply a repayment and append it to the log
    ///
    /// On error neither the loan nor the log changes.
    pub fn repay(
        &mut self,
        date: NaiveDate,
        amount: Decimal,
        repayment_type: RepaymentType,
    ) -> Result<&LoanRepayment, LoanError> {
        let accrued = self.loan.accrue_interest_with(date, &self.convention)?;
        let repayment_id = format!("{}-R{}", self.loan.loan_id, self.repayments.len() + 1);
        let (next, repayment) =
            accrued.apply_repayment(repayment_id, date, amount, repayment_type)?;

        self.loan = next;
        self.repayments.push(repayment);
        Ok(&self.repayments[self.repayments.len() - 1])
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            loan_id: self.loan.loan_id.clone(),
            status: self.loan.status(),
            repayment_count: self.repayments.len(),
            principal_repaid: self.repayments.iter().map(|r| r.principal_portion).sum(),
            interest_repaid: self.repayments.iter().map(|r| r.interest_portion).sum(),
            outstanding: self.loan.outstanding(),
        }
    }

    /// Hand the loan and log back to the caller for persistence
    pub fn into_parts(self) -> (Loan, Vec<LoanRepayment>) {
        (self.loan, self.repayments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicyStatus, PolicyType};
    use crate::rates::{RateRow, RateTable, SsvTable};
    use chrono::Days;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan_with(remaining_balance: Decimal, accrued_interest: Decimal) -> Loan {
        Loan {
            loan_id: "L-1".to_string(),
            policy_holder_ref: "PN-0001".to_string(),
            loan_amount: remaining_balance,
            interest_rate: dec!(0.09),
            disbursement_date: date(2023, 1, 1),
            last_interest_date: date(2023, 1, 1),
            accrued_interest,
            remaining_balance,
        }
    }

    #[test]
    fn test_disburse() {
        let d = date(2023, 1, 1);
        let loan = Loan::disburse("L-1", "PN-1", dec!(50000), dec!(0.09), d, dec!(315000)).unwrap();

        assert_eq!(loan.remaining_balance, dec!(50000));
        assert_eq!(loan.accrued_interest, Decimal::ZERO);
        assert_eq!(loan.last_interest_date, date(2023, 1, 1));
        assert_eq!(loan.status(), LoanStatus::Active);
    }

    #[test]
    fn test_disburse_rejections() {
        let d = date(2023, 1, 1);

        assert_eq!(
            Loan::disburse("L-1", "PN-1", dec!(400000), dec!(0.09), d, dec!(315000)),
            Err(LoanError::ExceedsCapacity { requested: dec!(400000), capacity: dec!(315000) })
        );
        assert!(matches!(
            Loan::disburse("L-1", "PN-1", Decimal::ZERO, dec!(0.09), d, dec!(315000)),
            Err(LoanError::NonPositiveAmount { .. })
        ));
        assert!(matches!(
            Loan::disburse("L-1", "PN-1", dec!(1000), dec!(-0.01), d, dec!(315000)),
            Err(LoanError::NegativeRate { .. })
        ));
    }

    #[test]
    fn test_max_loan_capacity() {
        let gsv = RateTable::build(vec![RateRow::new(2, 5, dec!(35))]).unwrap();
        let policy = Policy::new("END-20", PolicyType::Endowment, gsv, SsvTable::default());
        let holder = PolicyHolder {
            policy_number: "PN-1".to_string(),
            customer_ref: "C-1".to_string(),
            policy_ref: "END-20".to_string(),
            sum_assured: dec!(1000000),
            issue_date: date(2020, 1, 1),
            status: PolicyStatus::InForce,
        };

        assert_eq!(
            max_loan_capacity(&policy, &holder, dec!(90), date(2023, 1, 1)),
            Ok(dec!(315000))
        );
        assert_eq!(
            max_loan_capacity(&policy, &holder, dec!(90), date(2021, 1, 1)),
            Ok(Decimal::ZERO)
        );
        assert!(max_loan_capacity(&policy, &holder, dec!(90), date(2019, 1, 1)).is_err());
    }

    #[test]
    fn test_accrue_simple_interest() {
        let loan = loan_with(dec!(100000), Decimal::ZERO);
        let accrued = loan.accrue_interest(date(2024, 1, 1)).unwrap();

        // 100,000 * 0.09 * 365 / 365
        assert_eq!(accrued.accrued_interest, dec!(9000));
        assert_eq!(accrued.last_interest_date, date(2024, 1, 1));
        assert_eq!(accrued.remaining_balance, dec!(100000));
    }

    #[test]
    fn test_accrue_partial_period_rounds_to_cents() {
        let loan = loan_with(dec!(100000), Decimal::ZERO);
        let accrued = loan.accrue_interest(date(2023, 1, 11)).unwrap();

        // 100,000 * 0.09 * 10 / 365 = 246.5753...
        assert_eq!(accrued.accrued_interest, dec!(246.58));
    }

    #[test]
    fn test_accrue_does_not_compound() {
        let loan = loan_with(dec!(100000), dec!(5000));
        let accrued = loan.accrue_interest(date(2024, 1, 1)).unwrap();
        assert_eq!(accrued.accrued_interest, dec!(14000));
    }

    #[test]
    fn test_accrue_idempotent_same_date() {
        let loan = loan_with(dec!(100000), Decimal::ZERO);
        let once = loan.accrue_interest(date(2023, 7, 1)).unwrap();
        let twice = once.accrue_interest(date(2023, 7, 1)).unwrap();

        assert_eq!(once.accrued_interest, twice.accrued_interest);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_accrue_backdated_rejected() {
        let loan = loan_with(dec!(100000), Decimal::ZERO);
        assert!(matches!(
            loan.accrue_interest(date(2022, 12, 31)),
            Err(LoanError::Backdated { .. })
        ));
    }

    #[test]
    fn test_accrue_custom_day_count() {
        let loan = loan_with(dec!(36000), Decimal::ZERO);
        let convention = AccrualConvention { day_count_basis: 360, money_scale: 2 };
        let accrued = loan.accrue_interest_with(date(2023, 1, 31), &convention).unwrap();

        // 36,000 * 0.09 * 30 / 360
        assert_eq!(accrued.accrued_interest, dec!(270));
    }

    #[test]
    fn test_accrue_zero_day_count_rejected() {
        let loan = loan_with(dec!(36000), Decimal::ZERO);
        let convention = AccrualConvention { day_count_basis: 0, money_scale: 2 };
        assert_eq!(
            loan.accrue_interest_with(date(2023, 1, 31), &convention),
            Err(LoanError::ZeroDayCountBasis)
        );
    }

    #[test]
    fn test_accrue_negative_rate_rejected() {
        let loan = Loan { interest_rate: dec!(-0.09), ..loan_with(dec!(100000), Decimal::ZERO) };
        assert_eq!(
            loan.accrue_interest(date(2024, 1, 1)),
            Err(LoanError::NegativeRate { rate: dec!(-0.09) })
        );
    }

    #[test]
    fn test_repayment_on_invalid_loan_rejected() {
        let negative_rate =
            Loan { interest_rate: dec!(-0.09), ..loan_with(dec!(50000), dec!(5000)) };
        assert_eq!(
            negative_rate.apply_repayment("R-1", date(2023, 1, 1), dec!(100), RepaymentType::Both),
            Err(LoanError::NegativeRate { rate: dec!(-0.09) })
        );

        let negative_balance = loan_with(dec!(-100), dec!(-500));
        assert!(matches!(
            negative_balance.apply_repayment("R-1", date(2023, 1, 1), dec!(1), RepaymentType::Both),
            Err(LoanError::NegativeBalance { .. })
        ));
    }

    #[test]
    fn test_settled_loan_accrues_nothing() {
        let loan = loan_with(Decimal::ZERO, Decimal::ZERO);
        let accrued = loan.accrue_interest(date(2030, 1, 1)).unwrap();
        assert_eq!(accrued.accrued_interest, Decimal::ZERO);
        assert!(accrued.is_settled());
    }

    #[test]
    fn test_overpayment_rejected() {
        let loan = loan_with(dec!(50000), dec!(5000));
        let err = loan
            .apply_repayment("R-1", date(2023, 1, 1), dec!(60000), RepaymentType::Both)
            .unwrap_err();

        assert_eq!(err, LoanError::ExceedsBalance { attempted: dec!(60000), ceiling: dec!(55000) });
    }

    #[test]
    fn test_interest_then_principal_settles() {
        let loan = loan_with(dec!(50000), dec!(5000));

        let (loan, first) = loan
            .apply_repayment("R-1", date(2023, 1, 1), dec!(5000), RepaymentType::Interest)
            .unwrap();
        assert_eq!(loan.accrued_interest, Decimal::ZERO);
        assert_eq!(loan.remaining_balance, dec!(50000));
        assert_eq!(first.resulting_balance, dec!(50000));
        assert_eq!(loan.status(), LoanStatus::Active);

        let (loan, second) = loan
            .apply_repayment("R-2", date(2023, 1, 1), dec!(50000), RepaymentType::Principal)
            .unwrap();
        assert_eq!(loan.status(), LoanStatus::Settled);
        assert_eq!(loan.remaining_balance, Decimal::ZERO);
        assert_eq!(loan.accrued_interest, Decimal::ZERO);
        assert_eq!(second.principal_portion, dec!(50000));
    }

    #[test]
    fn test_interest_repayment_capped_at_interest_due() {
        let loan = loan_with(dec!(50000), dec!(5000));
        let err = loan
            .apply_repayment("R-1", date(2023, 1, 1), dec!(6000), RepaymentType::Interest)
            .unwrap_err();
        assert_eq!(
            err,
            LoanError::ExceedsInterestDue { attempted: dec!(6000), ceiling: dec!(5000) }
        );
    }

    #[test]
    fn test_principal_repayment_capped_at_balance() {
        let loan = loan_with(dec!(50000), dec!(5000));
        let err = loan
            .apply_repayment("R-1", date(2023, 1, 1), dec!(52000), RepaymentType::Principal)
            .unwrap_err();
        assert_eq!(err, LoanError::ExceedsBalance { attempted: dec!(52000), ceiling: dec!(50000) });
    }

    #[test]
    fn test_both_applies_interest_first() {
        let loan = loan_with(dec!(50000), dec!(5000));
        let (loan, repayment) = loan
            .apply_repayment("R-1", date(2023, 1, 1), dec!(8000), RepaymentType::Both)
            .unwrap();

        assert_eq!(repayment.interest_portion, dec!(5000));
        assert_eq!(repayment.principal_portion, dec!(3000));
        assert_eq!(loan.accrued_interest, Decimal::ZERO);
        assert_eq!(loan.remaining_balance, dec!(47000));
    }

    #[test]
    fn test_input_loan_unchanged_on_error() {
        let loan = loan_with(dec!(50000), dec!(5000));
        let before = loan.clone();
        let _ = loan.apply_repayment("R-1", date(2023, 1, 1), dec!(-1), RepaymentType::Both);
        assert_eq!(loan, before);
    }

    #[test]
    fn test_ledger_accrues_before_repaying() {
        let mut ledger = LoanLedger::new(loan_with(dec!(100000), Decimal::ZERO));

        let repayment = ledger
            .repay(date(2024, 1, 1), dec!(9000), RepaymentType::Interest)
            .unwrap();
        assert_eq!(repayment.repayment_id, "L-1-R1");
        assert_eq!(repayment.resulting_accrued_interest, Decimal::ZERO);

        let summary = ledger.summary();
        assert_eq!(summary.interest_repaid, dec!(9000));
        assert_eq!(summary.principal_repaid, Decimal::ZERO);
        assert_eq!(summary.outstanding, dec!(100000));
    }

    #[test]
    fn test_ledger_rejection_commits_nothing() {
        let mut ledger = LoanLedger::new(loan_with(dec!(100000), Decimal::ZERO));
        let before = ledger.loan().clone();

        let err = ledger.repay(date(2024, 1, 1), dec!(200000), RepaymentType::Both).unwrap_err();
        assert_eq!(
            err,
            LoanError::ExceedsBalance { attempted: dec!(200000), ceiling: dec!(109000) }
        );
        assert_eq!(ledger.loan(), &before);
        assert!(ledger.repayments().is_empty());
    }

    #[test]
    fn test_ledger_full_settlement() {
        let mut ledger = LoanLedger::new(loan_with(dec!(100000), Decimal::ZERO));

        ledger.repay(date(2023, 7, 1), dec!(20000), RepaymentType::Both).unwrap();
        let outstanding = ledger.loan().accrue_interest(date(2024, 1, 1)).unwrap().outstanding();
        ledger.repay(date(2024, 1, 1), outstanding, RepaymentType::Both).unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.status, LoanStatus::Settled);
        assert_eq!(summary.repayment_count, 2);
        assert_eq!(summary.principal_repaid, dec!(100000));
        assert_eq!(summary.outstanding, Decimal::ZERO);

        // Nothing more accrues once settled
        assert_eq!(ledger.accrue_to(date(2025, 1, 1)), Ok(Decimal::ZERO));
    }

    proptest! {
        #[test]
        fn prop_exact_repayments_always_settle(
            principal_cents in 1i64..100_000_000,
            interest_cents in 0i64..10_000_000,
            steps in proptest::collection::vec((0u8..3, 1i64..5_000_000, 0u64..400), 0..12),
        ) {
            let principal = Decimal::new(principal_cents, 2);
            let interest = Decimal::new(interest_cents, 2);
            let mut loan = loan_with(principal, interest);
            let mut on = loan.last_interest_date;
            let mut accrued = Decimal::ZERO;
            let mut paid = Decimal::ZERO;

            for (kind, chunk_cents, days) in steps {
                on = on + Days::new(days);
                let before = loan.accrued_interest;
                loan = loan.accrue_interest(on).unwrap();
                accrued += loan.accrued_interest - before;

                let chunk = Decimal::new(chunk_cents, 2);
                let (repayment_type, ceiling) = match kind {
                    0 => (RepaymentType::Interest, loan.accrued_interest),
                    1 => (RepaymentType::Principal, loan.remaining_balance),
                    _ => (RepaymentType::Both, loan.outstanding()),
                };
                let amount = chunk.min(ceiling);
                if amount.is_zero() {
                    continue;
                }
                let (next, _) = loan.apply_repayment("R", on, amount, repayment_type).unwrap();
                loan = next;
                paid += amount;
            }

            let rest = loan.outstanding();
            if !rest.is_zero() {
                let (next, _) = loan.apply_repayment("R", on, rest, RepaymentType::Both).unwrap();
                loan = next;
                paid += rest;
            }

            prop_assert!(accrued >= Decimal::ZERO);
            prop_assert_eq!(paid, principal + interest + accrued);
            prop_assert_eq!(loan.status(), LoanStatus::Settled);
            prop_assert!(loan.remaining_balance.is_zero());
            prop_assert!(loan.accrued_interest.is_zero());
        }
    }
}
