use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value::{compound_factor, pct_to_rate};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// How a year of inflation shrinks purchasing power.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErosionMethod {
    /// Loses `i` of the remaining value each year: `(1 − i)^n`
    #[default]
    Erosion,
    /// Divides by the price level: `1 / (1 + i)^n`
    Deflator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationInput {
    pub amount: Money,
    pub inflation_rate_pct: Decimal,
    pub years: u32,
    #[serde(default)]
    pub method: ErosionMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationOutput {
    /// Today's purchasing power of `amount` received after `years`
    pub real_value: Money,
    /// Same figure under the price-level deflator
    pub deflated_value: Money,
    /// Nominal amount needed then to buy what `amount` buys now
    pub nominal_needed: Money,
    pub purchasing_power_loss: Rate,
}

fn scale(amount: Money, factor: Decimal, context: &str) -> FinCalcResult<Money> {
    amount
        .checked_mul(factor)
        .ok_or_else(|| FinCalcError::NumericOverflow {
            context: context.into(),
        })
}

pub fn calculate_inflation(input: &InflationInput) -> FinCalcResult<ComputationOutput<InflationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.amount < Decimal::ZERO {
        return Err(FinCalcError::invalid("amount", "must not be negative"));
    }
    if input.inflation_rate_pct <= Decimal::from(-100) {
        return Err(FinCalcError::invalid(
            "inflation_rate_pct",
            "must be greater than -100%",
        ));
    }
    if input.method == ErosionMethod::Erosion && input.inflation_rate_pct > Decimal::from(100) {
        return Err(FinCalcError::invalid(
            "inflation_rate_pct",
            "must not exceed 100% when eroding by (1 - i)^n",
        ));
    }
    if input.inflation_rate_pct.is_sign_negative() {
        warnings.push("Negative inflation: purchasing power grows".into());
    }

    let rate = pct_to_rate(input.inflation_rate_pct);
    let price_level = compound_factor(rate, input.years)?;
    let deflator = Decimal::ONE
        .checked_div(price_level)
        .ok_or_else(|| FinCalcError::DivisionByZero {
            context: format!("price level (1 + {rate})^{} underflowed to zero", input.years),
        })?;
    let retained = match input.method {
        ErosionMethod::Erosion => compound_factor(-rate, input.years)?,
        ErosionMethod::Deflator => deflator,
    };

    let output = InflationOutput {
        real_value: scale(input.amount, retained, "real value")?,
        deflated_value: scale(input.amount, deflator, "deflated value")?,
        nominal_needed: scale(input.amount, price_level, "nominal amount needed")?,
        purchasing_power_loss: Decimal::ONE - retained,
    };

    let assumptions = serde_json::json!({
        "inflation_rate_pct": input.inflation_rate_pct.to_string(),
        "years": input.years,
        "method": input.method,
        "compounding": "annual",
    });

    let methodology = match input.method {
        ErosionMethod::Erosion => "Erode by (1 - i)^n",
        ErosionMethod::Deflator => "Deflate by (1 + i)^n",
    };

    Ok(with_metadata(
        methodology,
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}
