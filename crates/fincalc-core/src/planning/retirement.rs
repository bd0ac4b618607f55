use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// Safe withdrawal rate behind the 25× rule
pub const DEFAULT_WITHDRAWAL_RATE: Rate = dec!(0.04);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireInput {
    pub annual_expense: Money,
    /// Labour pension and other guaranteed income, per month
    #[serde(default)]
    pub monthly_pension: Money,
    #[serde(default)]
    pub current_assets: Money,
    #[serde(default = "default_withdrawal_rate")]
    pub withdrawal_rate: Rate,
}

fn default_withdrawal_rate() -> Rate {
    DEFAULT_WITHDRAWAL_RATE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireOutput {
    /// Expenses not covered by the pension
    pub yearly_gap: Money,
    pub fire_number: Money,
    /// Share of the target already held, capped at 1
    pub progress: Rate,
    pub shortfall: Money,
}

/// Portfolio size at which withdrawals cover the yearly gap.
pub fn calculate_fire(input: &FireInput) -> FinCalcResult<ComputationOutput<FireOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_expense < Decimal::ZERO {
        return Err(FinCalcError::invalid("annual_expense", "must not be negative"));
    }
    if input.monthly_pension < Decimal::ZERO {
        return Err(FinCalcError::invalid("monthly_pension", "must not be negative"));
    }
    if input.current_assets < Decimal::ZERO {
        return Err(FinCalcError::invalid("current_assets", "must not be negative"));
    }
    if input.withdrawal_rate <= Decimal::ZERO || input.withdrawal_rate > Decimal::ONE {
        return Err(FinCalcError::invalid("withdrawal_rate", "must be in (0, 1]"));
    }

    let yearly_gap = (input.annual_expense - input.monthly_pension * dec!(12)).max(Decimal::ZERO);
    let fire_number = yearly_gap / input.withdrawal_rate;

    let progress = if fire_number.is_zero() {
        warnings.push("Pension covers all expenses; no portfolio needed".into());
        Decimal::ONE
    } else {
        (input.current_assets / fire_number).min(Decimal::ONE)
    };

    let output = FireOutput {
        yearly_gap,
        fire_number,
        progress,
        shortfall: (fire_number - input.current_assets).max(Decimal::ZERO),
    };

    let assumptions = serde_json::json!({
        "withdrawal_rate": input.withdrawal_rate.to_string(),
        "pension_months_per_year": 12,
    });

    Ok(with_metadata(
        "Yearly gap divided by safe withdrawal rate",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(expense: Money, pension: Money, assets: Money) -> FireInput {
        FireInput {
            annual_expense: expense,
            monthly_pension: pension,
            current_assets: assets,
            withdrawal_rate: DEFAULT_WITHDRAWAL_RATE,
        }
    }

    #[test]
    fn test_fire_number_is_25x_gap() {
        let out = calculate_fire(&input(dec!(600000), dec!(20000), dec!(2000000))).unwrap();
        let r = &out.result;
        assert_eq!(r.yearly_gap, dec!(360000));
        assert_eq!(r.fire_number, dec!(9000000));
        assert_eq!(r.shortfall, dec!(7000000));
        assert!((r.progress - dec!(0.2222)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_pension_covers_everything() {
        let out = calculate_fire(&input(dec!(200000), dec!(20000), dec!(0))).unwrap();
        assert_eq!(out.result.fire_number, Decimal::ZERO);
        assert_eq!(out.result.progress, Decimal::ONE);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_progress_capped() {
        let out = calculate_fire(&input(dec!(400000), dec!(0), dec!(50000000))).unwrap();
        assert_eq!(out.result.progress, Decimal::ONE);
        assert_eq!(out.result.shortfall, Decimal::ZERO);
    }

    #[test]
    fn test_zero_withdrawal_rate_rejected() {
        let mut i = input(dec!(400000), dec!(0), dec!(0));
        i.withdrawal_rate = Decimal::ZERO;
        assert!(calculate_fire(&i).is_err());
    }
}
