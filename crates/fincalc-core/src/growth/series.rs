use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value::{annuity_future_value, monthly_rate, pct_to_rate};
use crate::types::{with_metadata, ComputationOutput, Money, SeriesPoint};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Series generators
// ---------------------------------------------------------------------------

fn validate_rate_pct(annual_rate_pct: Decimal) -> FinCalcResult<()> {
    if annual_rate_pct <= Decimal::from(-100) {
        return Err(FinCalcError::invalid(
            "annual_rate_pct",
            "must be greater than -100%",
        ));
    }
    Ok(())
}

/// `principal · (1 + pct/100)^t` for `t = 0..=periods`.
pub fn compound_series(
    principal: Money,
    annual_rate_pct: Decimal,
    periods: u32,
) -> FinCalcResult<Vec<SeriesPoint>> {
    if principal < Decimal::ZERO {
        return Err(FinCalcError::invalid("principal", "must not be negative"));
    }
    if periods == 0 {
        return Err(FinCalcError::invalid("periods", "must be at least 1"));
    }
    validate_rate_pct(annual_rate_pct)?;

    let growth = Decimal::ONE + pct_to_rate(annual_rate_pct);
    let mut value = principal;
    let mut series = Vec::with_capacity(periods as usize + 1);
    series.push(SeriesPoint { index: 0, value });
    for t in 1..=periods {
        value = value
            .checked_mul(growth)
            .ok_or_else(|| FinCalcError::NumericOverflow {
                context: format!("compound series at period {t}"),
            })?;
        series.push(SeriesPoint { index: t, value });
    }
    Ok(series)
}

/// Year-end balance of a monthly contribution plan, `value(0) = 0`.
/// A zero rate is the plain sum of contributions.
pub fn periodic_contribution_series(
    monthly_amount: Money,
    annual_rate_pct: Decimal,
    years: u32,
) -> FinCalcResult<Vec<SeriesPoint>> {
    if monthly_amount < Decimal::ZERO {
        return Err(FinCalcError::invalid(
            "monthly_amount",
            "must not be negative",
        ));
    }
    if years == 0 {
        return Err(FinCalcError::invalid("years", "must be at least 1"));
    }
    contribution_months(years)?;
    validate_rate_pct(annual_rate_pct)?;

    let r = monthly_rate(annual_rate_pct);
    (0..=years)
        .map(|y| {
            let value = if y == 0 {
                Decimal::ZERO
            } else {
                annuity_future_value(monthly_amount, r, contribution_months(y)?)?
            };
            Ok(SeriesPoint { index: y, value })
        })
        .collect()
}

fn contribution_months(years: u32) -> FinCalcResult<u32> {
    years
        .checked_mul(12)
        .ok_or_else(|| FinCalcError::invalid("years", "too many years to count in months"))
}

fn last_value(series: &[SeriesPoint]) -> Money {
    series.last().map(|p| p.value).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Compound calculator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundInput {
    pub principal: Money,
    pub annual_rate_pct: Decimal,
    pub years: u32,
    /// Second rate to race against, e.g. a deposit rate
    #[serde(default)]
    pub compare_rate_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundComparison {
    pub annual_rate_pct: Decimal,
    pub final_value: Money,
    /// Primary final value minus comparison final value
    pub advantage: Money,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundOutput {
    pub final_value: Money,
    pub total_growth: Money,
    pub growth_multiple: Decimal,
    pub series: Vec<SeriesPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<CompoundComparison>,
}

pub fn calculate_compound(input: &CompoundInput) -> FinCalcResult<ComputationOutput<CompoundOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let series = compound_series(input.principal, input.annual_rate_pct, input.years)?;
    let final_value = last_value(&series);

    let comparison = match input.compare_rate_pct {
        Some(rate) => {
            let other = compound_series(input.principal, rate, input.years)?;
            let other_final = last_value(&other);
            Some(CompoundComparison {
                annual_rate_pct: rate,
                final_value: other_final,
                advantage: final_value - other_final,
                series: other,
            })
        }
        None => None,
    };

    let growth_multiple = if input.principal.is_zero() {
        warnings.push("Zero principal: growth multiple undefined, reported as 0".into());
        Decimal::ZERO
    } else {
        final_value / input.principal
    };
    if input.annual_rate_pct < Decimal::ZERO {
        warnings.push("Negative rate: the series declines".into());
    }

    let output = CompoundOutput {
        final_value,
        total_growth: final_value - input.principal,
        growth_multiple,
        series,
        comparison,
    };

    let assumptions = serde_json::json!({
        "principal": input.principal.to_string(),
        "annual_rate_pct": input.annual_rate_pct.to_string(),
        "years": input.years,
        "compounding": "annual",
    });

    Ok(with_metadata(
        "Annual compounding, principal × (1 + r)^t",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

// ---------------------------------------------------------------------------
// DCA calculator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcaInput {
    pub monthly_amount: Money,
    pub annual_rate_pct: Decimal,
    pub years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcaOutput {
    pub final_value: Money,
    pub total_contributed: Money,
    pub profit: Money,
    pub series: Vec<SeriesPoint>,
}

pub fn calculate_dca(input: &DcaInput) -> FinCalcResult<ComputationOutput<DcaOutput>> {
    let start = Instant::now();

    let series = periodic_contribution_series(input.monthly_amount, input.annual_rate_pct, input.years)?;
    let final_value = last_value(&series);
    let total_contributed = input.monthly_amount * Decimal::from(contribution_months(input.years)?);

    let output = DcaOutput {
        final_value,
        total_contributed,
        profit: final_value - total_contributed,
        series,
    };

    let assumptions = serde_json::json!({
        "monthly_amount": input.monthly_amount.to_string(),
        "annual_rate_pct": input.annual_rate_pct.to_string(),
        "years": input.years,
        "timing": "end of month",
    });

    Ok(with_metadata(
        "Future value of level monthly contributions, monthly compounding at rate / 12",
        &assumptions,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compound_series_shape() {
        let s = compound_series(dec!(100000), dec!(6), 20).unwrap();
        assert_eq!(s.len(), 21);
        assert_eq!(s[0], SeriesPoint { index: 0, value: dec!(100000) });
        assert_eq!(s[1].value, dec!(106000));
        assert_eq!(s[2].value, dec!(112360));
        assert!(s.windows(2).all(|w| w[0].index + 1 == w[1].index));
    }

    #[test]
    fn test_compound_series_zero_rate_is_flat() {
        let s = compound_series(dec!(5000), dec!(0), 5).unwrap();
        assert!(s.iter().all(|p| p.value == dec!(5000)));
    }

    #[test]
    fn test_compound_series_rejects_zero_periods() {
        assert!(compound_series(dec!(1), dec!(5), 0).is_err());
        assert!(compound_series(dec!(-1), dec!(5), 3).is_err());
        assert!(compound_series(dec!(1), dec!(-100), 3).is_err());
    }

    #[test]
    fn test_contribution_series_origin_and_first_year() {
        let s = periodic_contribution_series(dec!(10000), dec!(6), 20).unwrap();
        assert_eq!(s.len(), 21);
        assert_eq!(s[0].value, Decimal::ZERO);
        // 10,000 × ((1.005)^12 − 1) / 0.005 ≈ 123,355.6
        assert!((s[1].value - dec!(123355.6)).abs() < dec!(1), "got {}", s[1].value);
    }

    #[test]
    fn test_contribution_series_zero_rate_is_linear() {
        let s = periodic_contribution_series(dec!(1000), dec!(0), 3).unwrap();
        let values: Vec<Money> = s.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![dec!(0), dec!(12000), dec!(24000), dec!(36000)]);
    }

    #[test]
    fn test_contribution_series_rejects_years_beyond_month_range() {
        match periodic_contribution_series(dec!(100), dec!(2), u32::MAX / 12 + 1) {
            Err(FinCalcError::InvalidInput { field, .. }) => assert_eq!(field, "years"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_calculate_compound_with_comparison() {
        let input = CompoundInput {
            principal: dec!(100000),
            annual_rate_pct: dec!(6),
            years: 20,
            compare_rate_pct: Some(dec!(1.7)),
        };
        let out = calculate_compound(&input).unwrap();
        let cmp = out.result.comparison.as_ref().unwrap();
        assert!(cmp.advantage > Decimal::ZERO);
        assert_eq!(cmp.series.len(), 21);
        // 1.06^20 ≈ 3.2071
        assert!((out.result.growth_multiple - dec!(3.2071)).abs() < dec!(0.001));
    }

    #[test]
    fn test_calculate_dca_profit() {
        let input = DcaInput {
            monthly_amount: dec!(10000),
            annual_rate_pct: dec!(6),
            years: 20,
        };
        let out = calculate_dca(&input).unwrap();
        let r = &out.result;
        assert_eq!(r.total_contributed, dec!(2400000));
        assert_eq!(r.profit, r.final_value - r.total_contributed);
        // 10,000 × ((1.005)^240 − 1) / 0.005 ≈ 4,620,409
        assert!((r.final_value - dec!(4620409)).abs() < dec!(5), "got {}", r.final_value);
    }
}
