use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::FinCalcError;
use crate::time_value::{level_payment, monthly_rate, round_to_unit};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::FinCalcResult;

/// Longest loan term accepted, 100 years
pub const MAX_TERM_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationParams {
    pub principal: Money,
    pub annual_rate_pct: Decimal,
    pub total_months: u32,
    /// Leading interest-only months
    #[serde(default)]
    pub grace_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GracePayments {
    /// Interest-only instalment during the grace period
    pub grace_payment: Money,
    /// Level instalment once principal repayment starts; 0 if no months remain
    pub normal_payment: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal_paid: Money,
    pub balance: Money,
    pub in_grace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    pub annual_rate_pct: Decimal,
    pub total_months: u32,
    #[serde(default)]
    pub grace_months: u32,
    #[serde(default)]
    pub include_schedule: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOutput {
    pub grace_payment: Money,
    pub normal_payment: Money,
    pub amortizing_months: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    /// Principal still owed after the last scheduled month
    pub unpaid_balance: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<AmortizationRow>>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_loan(principal: Money, annual_rate_pct: Decimal) -> FinCalcResult<()> {
    if principal <= Decimal::ZERO {
        return Err(FinCalcError::invalid("principal", "must be positive"));
    }
    if annual_rate_pct < Decimal::ZERO {
        return Err(FinCalcError::invalid(
            "annual_rate_pct",
            "must not be negative",
        ));
    }
    Ok(())
}

fn validate_term(total_months: u32) -> FinCalcResult<()> {
    if total_months == 0 {
        return Err(FinCalcError::invalid("total_months", "must be positive"));
    }
    if total_months > MAX_TERM_MONTHS {
        return Err(FinCalcError::invalid(
            "total_months",
            format!("must not exceed {MAX_TERM_MONTHS}"),
        ));
    }
    Ok(())
}

fn validate_params(params: &AmortizationParams) -> FinCalcResult<()> {
    validate_loan(params.principal, params.annual_rate_pct)?;
    validate_term(params.total_months)
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Level monthly instalment `P·r·(1+r)^n / ((1+r)^n − 1)`, rounded to the
/// currency unit. A zero rate repays `P / n` each month.
pub fn monthly_payment(
    principal: Money,
    annual_rate_pct: Decimal,
    total_months: u32,
) -> FinCalcResult<Money> {
    validate_loan(principal, annual_rate_pct)?;
    validate_term(total_months)?;
    let payment = level_payment(principal, monthly_rate(annual_rate_pct), total_months)?;
    Ok(round_to_unit(payment))
}

/// Interest-only instalment `round(P·r)`.
pub fn grace_interest_only_payment(principal: Money, annual_rate_pct: Decimal) -> FinCalcResult<Money> {
    validate_loan(principal, annual_rate_pct)?;
    Ok(round_to_unit(principal * monthly_rate(annual_rate_pct)))
}

/// Instalments for a loan whose first `grace_months` are interest-only and
/// whose remainder amortises the full principal.
pub fn amortized_payment_with_grace(params: &AmortizationParams) -> FinCalcResult<GracePayments> {
    validate_params(params)?;

    let grace_payment = grace_interest_only_payment(params.principal, params.annual_rate_pct)?;
    let remaining = params.total_months.saturating_sub(params.grace_months);
    let normal_payment = if remaining > 0 {
        monthly_payment(params.principal, params.annual_rate_pct, remaining)?
    } else {
        Decimal::ZERO
    };

    Ok(GracePayments {
        grace_payment,
        normal_payment,
    })
}

/// Month-by-month rows, produced lazily. Interest is rounded to cents; the
/// final amortising month absorbs rounding so the balance closes at zero.
#[derive(Debug, Clone)]
pub struct AmortizationRows {
    rate: Decimal,
    payments: GracePayments,
    grace: u32,
    total_months: u32,
    month: u32,
    balance: Money,
}

impl Iterator for AmortizationRows {
    type Item = AmortizationRow;

    fn next(&mut self) -> Option<AmortizationRow> {
        if self.month >= self.total_months {
            return None;
        }
        self.month += 1;
        let month = self.month;

        if month <= self.grace {
            return Some(AmortizationRow {
                month,
                payment: self.payments.grace_payment,
                interest: self.payments.grace_payment,
                principal_paid: Decimal::ZERO,
                balance: self.balance,
                in_grace: true,
            });
        }

        let interest = (self.balance * self.rate).round_dp(2);
        let mut principal_paid = self.payments.normal_payment - interest;
        if month == self.total_months || principal_paid > self.balance {
            principal_paid = self.balance;
        }
        let principal_paid = principal_paid.max(Decimal::ZERO);
        self.balance -= principal_paid;

        Some(AmortizationRow {
            month,
            payment: principal_paid + interest,
            interest,
            principal_paid,
            balance: self.balance,
            in_grace: false,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total_months - self.month) as usize;
        (left, Some(left))
    }
}

pub fn amortization_rows(params: &AmortizationParams) -> FinCalcResult<AmortizationRows> {
    let payments = amortized_payment_with_grace(params)?;
    Ok(AmortizationRows {
        rate: monthly_rate(params.annual_rate_pct),
        payments,
        grace: params.grace_months.min(params.total_months),
        total_months: params.total_months,
        month: 0,
        balance: params.principal,
    })
}

pub fn amortization_schedule(params: &AmortizationParams) -> FinCalcResult<Vec<AmortizationRow>> {
    Ok(amortization_rows(params)?.collect())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn calculate_loan(input: &LoanInput) -> FinCalcResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let params = AmortizationParams {
        principal: input.principal,
        annual_rate_pct: input.annual_rate_pct,
        total_months: input.total_months,
        grace_months: input.grace_months,
    };
    let payments = amortized_payment_with_grace(&params)?;

    let amortizing_months = input.total_months.saturating_sub(input.grace_months);
    if amortizing_months == 0 {
        warn!(
            grace_months = input.grace_months,
            total_months = input.total_months,
            "grace period covers the whole loan term"
        );
        warnings.push(format!(
            "Grace period of {} months covers the whole {}-month term; principal is never repaid",
            input.grace_months, input.total_months
        ));
    }
    if input.annual_rate_pct.is_zero() {
        warnings.push("Zero interest rate: principal repaid in equal instalments".into());
    }

    let mut total_paid = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut unpaid_balance = input.principal;
    let mut schedule = input.include_schedule.then(Vec::new);
    for row in amortization_rows(&params)? {
        total_paid += row.payment;
        total_interest += row.interest;
        unpaid_balance = row.balance;
        if let Some(rows) = schedule.as_mut() {
            rows.push(row);
        }
    }

    let output = LoanOutput {
        grace_payment: payments.grace_payment,
        normal_payment: payments.normal_payment,
        amortizing_months,
        total_paid,
        total_interest,
        unpaid_balance,
        schedule,
    };

    let assumptions = serde_json::json!({
        "principal": input.principal.to_string(),
        "annual_rate_pct": input.annual_rate_pct.to_string(),
        "total_months": input.total_months,
        "grace_months": input.grace_months,
        "compounding": "monthly, nominal annual rate / 12",
        "rounding": "instalments to the currency unit, interest to cents",
    });

    Ok(with_metadata(
        "Level-payment annuity with interest-only grace period",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params(principal: Money, rate: Decimal, months: u32, grace: u32) -> AmortizationParams {
        AmortizationParams {
            principal,
            annual_rate_pct: rate,
            total_months: months,
            grace_months: grace,
        }
    }

    #[test]
    fn test_monthly_payment_mortgage_reference() {
        // 10M over 30 years at 2.1%
        let p = monthly_payment(dec!(10000000), dec!(2.1), 360).unwrap();
        assert!((p - dec!(37450)).abs() <= dec!(50), "got {p}");
    }

    #[test]
    fn test_monthly_payment_zero_rate() {
        let p = monthly_payment(dec!(1200000), dec!(0), 240).unwrap();
        assert_eq!(p, dec!(5000));
    }

    #[test]
    fn test_monthly_payment_invalid_inputs() {
        assert!(monthly_payment(dec!(0), dec!(2), 12).is_err());
        assert!(monthly_payment(dec!(1000), dec!(-1), 12).is_err());
        match monthly_payment(dec!(1000), dec!(2), 0) {
            Err(FinCalcError::InvalidInput { field, .. }) => assert_eq!(field, "total_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_term_beyond_cap_rejected_before_building_rows() {
        let input = LoanInput {
            principal: dec!(1000000),
            annual_rate_pct: dec!(0),
            total_months: u32::MAX,
            grace_months: 0,
            include_schedule: false,
        };
        match calculate_loan(&input) {
            Err(FinCalcError::InvalidInput { field, .. }) => assert_eq!(field, "total_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_rows_are_lazy_and_sized() {
        let rows = amortization_rows(&params(dec!(120000), dec!(3), 12, 2)).unwrap();
        assert_eq!(rows.size_hint(), (12, Some(12)));
        let first_two: Vec<AmortizationRow> = rows.take(2).collect();
        assert!(first_two.iter().all(|r| r.in_grace));
    }

    #[test]
    fn test_schedule_omitted_totals_match_schedule() {
        let mut input = LoanInput {
            principal: dec!(3000000),
            annual_rate_pct: dec!(2.6),
            total_months: 240,
            grace_months: 24,
            include_schedule: false,
        };
        let without = calculate_loan(&input).unwrap().result;
        input.include_schedule = true;
        let with = calculate_loan(&input).unwrap().result;
        assert!(without.schedule.is_none());
        assert_eq!(without.total_paid, with.total_paid);
        assert_eq!(without.total_interest, with.total_interest);
    }

    #[test]
    fn test_grace_payment_interest_only() {
        // 10M × 2.1% / 12 = 17,500
        let g = grace_interest_only_payment(dec!(10000000), dec!(2.1)).unwrap();
        assert_eq!(g, dec!(17500));
    }

    #[test]
    fn test_grace_raises_normal_payment() {
        let no_grace = amortized_payment_with_grace(&params(dec!(10000000), dec!(2.1), 360, 0)).unwrap();
        let with_grace = amortized_payment_with_grace(&params(dec!(10000000), dec!(2.1), 360, 36)).unwrap();
        assert!(with_grace.normal_payment > no_grace.normal_payment);
        assert_eq!(
            with_grace.normal_payment,
            monthly_payment(dec!(10000000), dec!(2.1), 324).unwrap()
        );
    }

    #[test]
    fn test_grace_covering_term_gives_zero_normal_payment() {
        let p = amortized_payment_with_grace(&params(dec!(1000000), dec!(3), 24, 36)).unwrap();
        assert_eq!(p.normal_payment, Decimal::ZERO);
        assert_eq!(p.grace_payment, dec!(2500));
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let rows = amortization_schedule(&params(dec!(500000), dec!(4.5), 60, 0)).unwrap();
        assert_eq!(rows.len(), 60);
        assert_eq!(rows.last().unwrap().balance, Decimal::ZERO);
        let principal_sum: Money = rows.iter().map(|r| r.principal_paid).sum();
        assert_eq!(principal_sum, dec!(500000));
    }

    #[test]
    fn test_schedule_grace_rows_keep_balance() {
        let rows = amortization_schedule(&params(dec!(1000000), dec!(2), 24, 6)).unwrap();
        assert!(rows[..6].iter().all(|r| r.in_grace && r.balance == dec!(1000000)));
        assert!(!rows[6].in_grace);
        assert!(rows[6].balance < dec!(1000000));
    }

    #[test]
    fn test_calculate_loan_warns_when_grace_covers_term() {
        let input = LoanInput {
            principal: dec!(1000000),
            annual_rate_pct: dec!(3),
            total_months: 12,
            grace_months: 12,
            include_schedule: false,
        };
        let out = calculate_loan(&input).unwrap();
        assert_eq!(out.result.unpaid_balance, dec!(1000000));
        assert_eq!(out.result.amortizing_months, 0);
        assert!(out.result.schedule.is_none());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_calculate_loan_totals() {
        let input = LoanInput {
            principal: dec!(10000000),
            annual_rate_pct: dec!(2.1),
            total_months: 360,
            grace_months: 0,
            include_schedule: true,
        };
        let out = calculate_loan(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.total_paid - r.total_interest, dec!(10000000));
        assert_eq!(r.schedule.as_ref().map(|s| s.len()), Some(360));
        assert_eq!(r.unpaid_balance, Decimal::ZERO);
    }
}
