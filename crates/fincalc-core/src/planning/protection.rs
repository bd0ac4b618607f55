use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::FinCalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceGapInput {
    /// Mortgage and other debt outstanding
    pub debt: Money,
    pub annual_family_support: Money,
    pub support_years: u32,
    #[serde(default)]
    pub savings: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceGapOutput {
    pub total_needs: Money,
    /// Suggested life cover
    pub coverage_gap: Money,
    pub surplus: Money,
}

/// Needs-based life cover: debt plus family support, less liquid savings.
pub fn calculate_insurance_gap(
    input: &InsuranceGapInput,
) -> FinCalcResult<ComputationOutput<InsuranceGapOutput>> {
    let start = Instant::now();

    for (field, value) in [
        ("debt", input.debt),
        ("annual_family_support", input.annual_family_support),
        ("savings", input.savings),
    ] {
        if value < Decimal::ZERO {
            return Err(FinCalcError::invalid(field, "must not be negative"));
        }
    }

    let total_needs = input.debt + input.annual_family_support * Decimal::from(input.support_years);
    let output = InsuranceGapOutput {
        total_needs,
        coverage_gap: (total_needs - input.savings).max(Decimal::ZERO),
        surplus: (input.savings - total_needs).max(Decimal::ZERO),
    };

    let assumptions = serde_json::json!({
        "support_years": input.support_years,
        "discounting": "none",
    });

    Ok(with_metadata(
        "Needs approach: debt + support × years − savings",
        &assumptions,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        output,
    ))
}
