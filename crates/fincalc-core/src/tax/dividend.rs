use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// NHI supplementary premium rate on dividend income
pub const SUPPLEMENTARY_PREMIUM_RATE: Rate = dec!(0.0211);
/// Single payments below this are exempt from the supplementary premium
pub const SUPPLEMENTARY_PREMIUM_THRESHOLD: Money = dec!(20000);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendInput {
    pub shares: Decimal,
    /// Cash dividend per share over a full year
    pub dividend_per_share: Money,
    /// 1 = annual, 4 = quarterly, 12 = monthly
    #[serde(default = "default_payments")]
    pub payments_per_year: u32,
    #[serde(default = "default_premium_rate")]
    pub premium_rate: Rate,
    #[serde(default = "default_threshold")]
    pub threshold: Money,
}

fn default_payments() -> u32 {
    1
}

fn default_premium_rate() -> Rate {
    SUPPLEMENTARY_PREMIUM_RATE
}

fn default_threshold() -> Money {
    SUPPLEMENTARY_PREMIUM_THRESHOLD
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendOutput {
    pub total_dividend: Money,
    pub per_payment: Money,
    pub premium_applies: bool,
    /// Supplementary premium withheld over the year
    pub supplementary_premium: Money,
    pub net_income: Money,
}

/// Dividend income net of the supplementary health-insurance premium, which
/// is withheld from each single payment that reaches the threshold.
pub fn calculate_dividend_income(
    input: &DividendInput,
) -> FinCalcResult<ComputationOutput<DividendOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.shares < Decimal::ZERO {
        return Err(FinCalcError::invalid("shares", "must not be negative"));
    }
    if input.dividend_per_share < Decimal::ZERO {
        return Err(FinCalcError::invalid(
            "dividend_per_share",
            "must not be negative",
        ));
    }
    if input.payments_per_year == 0 {
        return Err(FinCalcError::invalid(
            "payments_per_year",
            "must be at least 1",
        ));
    }
    if input.premium_rate < Decimal::ZERO || input.premium_rate >= Decimal::ONE {
        return Err(FinCalcError::invalid("premium_rate", "must be in [0, 1)"));
    }

    let total_dividend = input.shares * input.dividend_per_share;
    let payments = Decimal::from(input.payments_per_year);
    let per_payment = total_dividend / payments;

    let premium_applies = per_payment >= input.threshold;
    let supplementary_premium = if premium_applies {
        (per_payment * input.premium_rate).floor() * payments
    } else {
        Decimal::ZERO
    };

    if !premium_applies && total_dividend >= input.threshold {
        warnings.push(format!(
            "Annual dividend exceeds {} but each of the {} payments stays below it",
            input.threshold, input.payments_per_year
        ));
    }

    let output = DividendOutput {
        total_dividend,
        per_payment,
        premium_applies,
        supplementary_premium,
        net_income: total_dividend - supplementary_premium,
    };

    let assumptions = serde_json::json!({
        "premium_rate": input.premium_rate.to_string(),
        "threshold": input.threshold.to_string(),
        "payments_per_year": input.payments_per_year,
    });

    Ok(with_metadata(
        "Supplementary premium per payment at or above threshold, floored per payment",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(shares: Decimal, dps: Decimal, freq: u32) -> DividendInput {
        DividendInput {
            shares,
            dividend_per_share: dps,
            payments_per_year: freq,
            premium_rate: SUPPLEMENTARY_PREMIUM_RATE,
            threshold: SUPPLEMENTARY_PREMIUM_THRESHOLD,
        }
    }

    #[test]
    fn test_annual_payment_above_threshold() {
        let out = calculate_dividend_income(&input(dec!(20000), dec!(1.5), 1)).unwrap();
        let r = &out.result;
        assert_eq!(r.total_dividend, dec!(30000));
        assert!(r.premium_applies);
        // 30,000 × 2.11% = 633
        assert_eq!(r.supplementary_premium, dec!(633));
        assert_eq!(r.net_income, dec!(29367));
    }

    #[test]
    fn test_quarterly_payments_escape_threshold() {
        let out = calculate_dividend_income(&input(dec!(20000), dec!(1.5), 4)).unwrap();
        let r = &out.result;
        assert_eq!(r.per_payment, dec!(7500));
        assert!(!r.premium_applies);
        assert_eq!(r.supplementary_premium, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let out = calculate_dividend_income(&input(dec!(10000), dec!(2), 1)).unwrap();
        assert!(out.result.premium_applies);
        assert_eq!(out.result.supplementary_premium, dec!(422));
    }

    #[test]
    fn test_zero_frequency_rejected() {
        assert!(calculate_dividend_income(&input(dec!(1000), dec!(1), 0)).is_err());
    }
}
