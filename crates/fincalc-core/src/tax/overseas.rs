use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::tax::brackets::TaxSchedule;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// Flat rate of the alternative minimum tax base
pub const AMT_RATE: Rate = dec!(0.20);
/// Basic AMT exemption for 2025
pub const DEFAULT_AMT_EXEMPTION: Money = dec!(7500000);
/// Overseas income below this never enters the AMT base
pub const MIN_OVERSEAS_QUOTA: Money = dec!(1000000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which figure the user supplied; the other one is derived from the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaBasis {
    #[default]
    Income,
    Tax,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverseasQuotaInput {
    #[serde(default)]
    pub basis: QuotaBasis,
    /// Net taxable income or regular tax, depending on `basis`
    pub amount: Money,
    #[serde(default = "default_amt_exemption")]
    pub amt_exemption: Money,
    /// Defaults to the built-in 2025 brackets
    #[serde(default)]
    pub schedule: Option<TaxSchedule>,
}

fn default_amt_exemption() -> Money {
    DEFAULT_AMT_EXEMPTION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverseasQuotaOutput {
    pub income: Money,
    pub regular_tax: Money,
    pub marginal_rate: Rate,
    pub amt_exemption: Money,
    /// Quota before the statutory floor
    pub raw_quota: Money,
    pub overseas_quota: Money,
    pub floor_applied: bool,
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

fn raw_quota(tax: Money, exemption: Money, income: Money) -> FinCalcResult<Money> {
    if tax < Decimal::ZERO {
        return Err(FinCalcError::invalid("tax", "must not be negative"));
    }
    if exemption < Decimal::ZERO {
        return Err(FinCalcError::invalid("exemption", "must not be negative"));
    }
    if income < Decimal::ZERO {
        return Err(FinCalcError::invalid("income", "must not be negative"));
    }
    Ok((tax / AMT_RATE + exemption - income).floor())
}

/// Overseas income that can be added before the AMT exceeds the regular tax:
/// `floor(tax / 20% + exemption − income)`, never below 1,000,000.
pub fn compute_overseas_quota(tax: Money, exemption: Money, income: Money) -> FinCalcResult<Money> {
    Ok(raw_quota(tax, exemption, income)?.max(MIN_OVERSEAS_QUOTA))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn calculate_overseas_quota(
    input: &OverseasQuotaInput,
) -> FinCalcResult<ComputationOutput<OverseasQuotaOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let builtin;
    let schedule = match input.schedule {
        Some(ref s) => s,
        None => {
            builtin = TaxSchedule::taiwan_2025();
            &builtin
        }
    };

    let (income, regular_tax) = match input.basis {
        QuotaBasis::Income => (input.amount, schedule.compute_tax(input.amount)?),
        QuotaBasis::Tax => {
            let income = schedule.compute_income_from_tax(input.amount)?;
            (income, input.amount)
        }
    };
    let marginal_rate = schedule.bracket_for_income(income).marginal_rate();

    let raw = raw_quota(regular_tax, input.amt_exemption, income)?;
    let overseas_quota = raw.max(MIN_OVERSEAS_QUOTA);
    let floor_applied = raw < MIN_OVERSEAS_QUOTA;
    if floor_applied {
        warnings.push(format!(
            "Computed quota {raw} is below the {MIN_OVERSEAS_QUOTA} reporting threshold; floor applied"
        ));
    }
    if input.basis == QuotaBasis::Tax {
        warnings.push("Income derived from tax is the smallest income producing that tax".into());
    }

    let output = OverseasQuotaOutput {
        income,
        regular_tax,
        marginal_rate,
        amt_exemption: input.amt_exemption,
        raw_quota: raw,
        overseas_quota,
        floor_applied,
    };

    let assumptions = serde_json::json!({
        "basis": input.basis,
        "amount": input.amount.to_string(),
        "amt_exemption": input.amt_exemption.to_string(),
        "amt_rate": AMT_RATE.to_string(),
        "schedule": if input.schedule.is_some() { "custom" } else { "taiwan_2025" },
    });

    Ok(with_metadata(
        "Progressive bracket tax; AMT headroom = tax / 20% + exemption − income",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(basis: QuotaBasis, amount: Money) -> OverseasQuotaInput {
        OverseasQuotaInput {
            basis,
            amount,
            amt_exemption: DEFAULT_AMT_EXEMPTION,
            schedule: None,
        }
    }

    #[test]
    fn test_quota_formula_reference() {
        let q = compute_overseas_quota(dec!(150900), dec!(7500000), dec!(1500000)).unwrap();
        assert_eq!(q, dec!(6754500));
    }

    #[test]
    fn test_quota_floor() {
        // A high earner has little AMT headroom left
        let q = compute_overseas_quota(dec!(0), dec!(7500000), dec!(7000000)).unwrap();
        assert_eq!(q, MIN_OVERSEAS_QUOTA);
    }

    #[test]
    fn test_quota_rejects_negative_inputs() {
        assert!(compute_overseas_quota(dec!(-1), dec!(0), dec!(0)).is_err());
        assert!(compute_overseas_quota(dec!(0), dec!(-1), dec!(0)).is_err());
        assert!(compute_overseas_quota(dec!(0), dec!(0), dec!(-1)).is_err());
    }

    #[test]
    fn test_calculate_from_income() {
        let out = calculate_overseas_quota(&input(QuotaBasis::Income, dec!(1500000))).unwrap();
        let r = &out.result;
        assert_eq!(r.regular_tax, dec!(150900));
        assert_eq!(r.overseas_quota, dec!(6754500));
        assert_eq!(r.marginal_rate, dec!(0.20));
        assert!(!r.floor_applied);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_calculate_from_tax_matches_income_mode() {
        let out = calculate_overseas_quota(&input(QuotaBasis::Tax, dec!(150900))).unwrap();
        assert_eq!(out.result.income, dec!(1500000));
        assert_eq!(out.result.overseas_quota, dec!(6754500));
    }

    #[test]
    fn test_calculate_reports_floor() {
        let mut no_exemption = input(QuotaBasis::Income, dec!(1500000));
        no_exemption.amt_exemption = Decimal::ZERO;
        let out = calculate_overseas_quota(&no_exemption).unwrap();
        // 150,900 / 20% − 1,500,000 = −745,500
        assert_eq!(out.result.raw_quota, dec!(-745500));
        assert!(out.result.floor_applied);
        assert_eq!(out.result.overseas_quota, MIN_OVERSEAS_QUOTA);
        assert!(out.result.raw_quota < MIN_OVERSEAS_QUOTA);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_input_defaults_from_json() {
        let parsed: OverseasQuotaInput = serde_json::from_str(r#"{"amount": "1500000"}"#).unwrap();
        assert_eq!(parsed.basis, QuotaBasis::Income);
        assert_eq!(parsed.amt_exemption, DEFAULT_AMT_EXEMPTION);
        assert!(parsed.schedule.is_none());
    }
}
