//! Guaranteed and Special Surrender Value calculations
//!
//! Both values are `sum_assured * rate / 100`, where the rate comes from the
//! tier matching the policy's whole elapsed years at the valuation date.

use crate::error::ValuationError;
use crate::loan::Loan;
use crate::policy::{Policy, PolicyHolder};
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of a GSV computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GsvResult {
    pub elapsed_years: u32,
    /// Matched tier rate (percentage)
    pub rate: Decimal,
    pub gsv: Decimal,
}

/// Result of an SSV computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsvResult {
    pub elapsed_years: u32,
    /// Matched tier rate (percentage)
    pub rate: Decimal,
    pub eligibility_years: u32,
    pub ssv: Decimal,
}

/// Surrender value net of an outstanding policy loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetValue {
    /// max(GSV, SSV)
    pub surrender_value: Decimal,
    /// Loan balance plus accrued interest
    pub outstanding_debt: Decimal,
    /// Never negative
    pub net_value: Decimal,
    pub loan_exceeds_surrender_value: bool,
}

impl NetValue {
    /// Offset a debt against a surrender value, flooring the result at zero
    pub fn offset(surrender_value: Decimal, outstanding_debt: Decimal) -> Self {
        let raw = surrender_value - outstanding_debt;
        let exceeds = raw < Decimal::ZERO;
        Self {
            surrender_value,
            outstanding_debt,
            net_value: if exceeds { Decimal::ZERO } else { raw },
            loan_exceeds_surrender_value: exceeds,
        }
    }
}

fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate / Decimal::ONE_HUNDRED
}

/// Compute the Guaranteed Surrender Value at `as_of`
///
/// `NoApplicableRate` means the policy is not yet surrenderable.
pub fn compute_gsv(
    policy: &Policy,
    holder: &PolicyHolder,
    as_of: NaiveDate,
) -> Result<GsvResult, ValuationError> {
    let elapsed_years = holder.elapsed_years(as_of)?;
    let rate = policy
        .gsv_rates
        .lookup(elapsed_years)
        .ok_or(ValuationError::NoApplicableRate { elapsed_years })?;

    let gsv = percent_of(holder.sum_assured, rate);
    debug!(
        "{}: GSV {} at {} elapsed years (rate {}%)",
        holder.policy_number, gsv, elapsed_years, rate
    );

    Ok(GsvResult { elapsed_years, rate, gsv })
}

/// Compute the Special Surrender Value at `as_of`
///
/// Fails with `NotEligible` when a tier matches but its eligibility period
/// has not yet been served.
pub fn compute_ssv(
    policy: &Policy,
    holder: &PolicyHolder,
    as_of: NaiveDate,
) -> Result<SsvResult, ValuationError> {
    let elapsed_years = holder.elapsed_years(as_of)?;
    let tier = policy
        .ssv_configs
        .lookup(elapsed_years)
        .ok_or(ValuationError::NoApplicableRate { elapsed_years })?;

    if elapsed_years < tier.eligibility_years {
        return Err(ValuationError::NotEligible {
            elapsed_years,
            eligibility_years: tier.eligibility_years,
        });
    }

    let ssv = percent_of(holder.sum_assured, tier.rate);
    debug!(
        "{}: SSV {} at {} elapsed years (rate {}%)",
        holder.policy_number, ssv, elapsed_years, tier.rate
    );

    Ok(SsvResult {
        elapsed_years,
        rate: tier.rate,
        eligibility_years: tier.eligibility_years,
        ssv,
    })
}

/// Treat "not yet available" states as a zero value, propagate real failures
fn value_or_zero<T>(
    result: Result<T, ValuationError>,
    value: impl FnOnce(&T) -> Decimal,
) -> Result<Decimal, ValuationError> {
    match result {
        Ok(res) => Ok(value(&res)),
        Err(err) if err.is_business_state() => Ok(Decimal::ZERO),
        Err(err) => Err(err),
    }
}

/// The greater of GSV and SSV, counting unavailable values as zero
pub fn surrender_value(
    policy: &Policy,
    holder: &PolicyHolder,
    as_of: NaiveDate,
) -> Result<Decimal, ValuationError> {
    let gsv = value_or_zero(compute_gsv(policy, holder, as_of), |r| r.gsv)?;
    let ssv = value_or_zero(compute_ssv(policy, holder, as_of), |r| r.ssv)?;
    Ok(gsv.max(ssv))
}

/// Surrender value after offsetting any loan balance and accrued interest
///
/// The loan is taken as given; accrue it to `as_of` first for an up-to-date figure.
pub fn compute_net_value(
    policy: &Policy,
    holder: &PolicyHolder,
    loan: Option<&Loan>,
    as_of: NaiveDate,
) -> Result<NetValue, ValuationError> {
    let value = surrender_value(policy, holder, as_of)?;
    let debt = loan.map(Loan::outstanding).unwrap_or(Decimal::ZERO);
    let net = NetValue::offset(value, debt);

    if net.loan_exceeds_surrender_value {
        warn!(
            "{}: loan debt {} exceeds surrender value {}",
            holder.policy_number, debt, value
        );
    }

    Ok(net)
}
