//! Valuation reports: the figures shown for a holding
//!
//! A report is a pure composition of surrender values and the current loan
//! snapshot. It holds no state and is rebuilt on demand.

use crate::config::EngineConfig;
use crate::error::{LoadError, LoanError, ValuationError};
use crate::loan::Loan;
use crate::policy::{Policy, PolicyHolder};
use crate::valuation::{compute_gsv, compute_ssv, NetValue};
use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a surrender value component can be paid out yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    /// No tier covers the elapsed duration
    NotYetSurrenderable,
    /// A tier matches but its eligibility period is not served
    NotEligible,
}

/// Split a computation into (value, availability), propagating real failures
fn figure<T>(
    result: Result<T, ValuationError>,
    value: impl FnOnce(&T) -> Decimal,
) -> Result<(Decimal, Availability), ValuationError> {
    match result {
        Ok(res) => Ok((value(&res), Availability::Available)),
        Err(ValuationError::NoApplicableRate { .. }) => {
            Ok((Decimal::ZERO, Availability::NotYetSurrenderable))
        }
        Err(ValuationError::NotEligible { .. }) => Ok((Decimal::ZERO, Availability::NotEligible)),
        Err(err) => Err(err),
    }
}

/// Figures displayed for one holding at a valuation date
///
/// Flat so that it can be written as a CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub policy_number: String,
    pub policy_ref: String,
    pub as_of: NaiveDate,
    pub elapsed_years: u32,

    pub gsv: Decimal,
    pub gsv_status: Availability,
    pub ssv: Decimal,
    pub ssv_status: Availability,

    /// max(GSV, SSV)
    pub surrender_value: Decimal,
    /// Loan balance plus accrued interest
    pub outstanding_debt: Decimal,
    pub net_value: Decimal,
    /// Capacity at the configured percentage, less existing debt, floored at zero
    pub available_loan_capacity: Decimal,
    pub loan_exceeds_surrender_value: bool,

    pub adb_cover: Option<Decimal>,
    pub ptd_cover: Option<Decimal>,
}

impl ValuationReport {
    /// Compose a report from the policy, holder, and current loan snapshot
    pub fn build(
        policy: &Policy,
        holder: &PolicyHolder,
        loan: Option<&Loan>,
        as_of: NaiveDate,
        loan_capacity_pct: Decimal,
    ) -> Result<Self, ValuationError> {
        let elapsed_years = holder.elapsed_years(as_of)?;
        let (gsv, gsv_status) = figure(compute_gsv(policy, holder, as_of), |r| r.gsv)?;
        let (ssv, ssv_status) = figure(compute_ssv(policy, holder, as_of), |r| r.ssv)?;

        let debt = loan.map(Loan::outstanding).unwrap_or(Decimal::ZERO);
        let net = NetValue::offset(gsv.max(ssv), debt);
        if net.loan_exceeds_surrender_value {
            warn!(
                "{}: loan debt {} exceeds surrender value {}",
                holder.policy_number, debt, net.surrender_value
            );
        }

        let capacity = net.surrender_value * loan_capacity_pct / Decimal::ONE_HUNDRED;
        let available_loan_capacity = (capacity - debt).max(Decimal::ZERO);
        let riders = policy.rider_cover(holder);

        Ok(Self {
            policy_number: holder.policy_number.clone(),
            policy_ref: holder.policy_ref.clone(),
            as_of,
            elapsed_years,
            gsv,
            gsv_status,
            ssv,
            ssv_status,
            surrender_value: net.surrender_value,
            outstanding_debt: net.outstanding_debt,
            net_value: net.net_value,
            available_loan_capacity,
            loan_exceeds_surrender_value: net.loan_exceeds_surrender_value,
            adb_cover: riders.adb,
            ptd_cover: riders.ptd,
        })
    }
}

/// Outcome of valuing one holding in a book
#[derive(Debug, Clone)]
pub struct BookValuation {
    pub policy_number: String,
    pub result: Result<ValuationReport, LoanError>,
}

/// Values books of holdings against a fixed set of policy definitions
///
/// Policies are loaded once and shared read-only across worker threads.
#[derive(Debug, Clone)]
pub struct ValuationRunner {
    policies: HashMap<String, Policy>,
    config: EngineConfig,
}

impl ValuationRunner {
    /// Create a runner, applying the configured tier overflow to every policy
    pub fn new(policies: HashMap<String, Policy>, config: EngineConfig) -> Self {
        let policies = policies
            .into_iter()
            .map(|(code, policy)| (code, policy.with_tier_overflow(config.tier_overflow)))
            .collect();
        Self { policies, config }
    }

    pub fn policy(&self, policy_code: &str) -> Option<&Policy> {
        self.policies.get(policy_code)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Value a single holding
    ///
    /// The loan is accrued to `as_of` on a copy before composing the report;
    /// the caller's loan is not changed.
    pub fn value_holder(
        &self,
        policy: &Policy,
        holder: &PolicyHolder,
        loan: Option<&Loan>,
        as_of: NaiveDate,
    ) -> Result<ValuationReport, LoanError> {
        if let Err(err) = policy.check_sum_assured(holder) {
            warn!("{}: {}", holder.policy_number, err);
        }

        let accrued = loan
            .map(|l| l.accrue_interest_with(as_of, &self.config.accrual))
            .transpose()?;

        Ok(ValuationReport::build(
            policy,
            holder,
            accrued.as_ref(),
            as_of,
            self.config.loan_capacity_pct,
        )?)
    }

    /// Value every holding in parallel
    ///
    /// Fails up front if any holder references an unknown policy; per-holding
    /// valuation failures are reported in the corresponding entry.
    pub fn value_book(
        &self,
        holders: &[PolicyHolder],
        loans: &HashMap<String, Loan>,
        as_of: NaiveDate,
    ) -> Result<Vec<BookValuation>, LoadError> {
        let mut resolved = Vec::with_capacity(holders.len());
        for holder in holders {
            let policy =
                self.policies.get(&holder.policy_ref).ok_or_else(|| LoadError::UnknownPolicy {
                    policy_number: holder.policy_number.clone(),
                    policy_ref: holder.policy_ref.clone(),
                })?;
            resolved.push((policy, holder));
        }

        let results: Vec<BookValuation> = resolved
            .par_iter()
            .map(|(policy, holder)| BookValuation {
                policy_number: holder.policy_number.clone(),
                result: self.value_holder(policy, holder, loans.get(&holder.policy_number), as_of),
            })
            .collect();

        let failed = results.iter().filter(|r| r.result.is_err()).count();
        info!("valued {} holdings as of {} ({} failed)", results.len(), as_of, failed);

        Ok(results)
    }
}
