use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value::{
    annuity_future_value, compound_factor, level_payment, monthly_rate, pct_to_rate,
    remaining_balance,
};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyInput {
    pub home_price: Money,
    pub monthly_rent: Money,
    /// Comparison horizon
    pub years: u32,
    /// Return earned by the renter's invested cash
    pub invest_return_pct: Decimal,
    pub home_appreciation_pct: Decimal,
    #[serde(default = "default_down_payment_ratio")]
    pub down_payment_ratio: Rate,
    #[serde(default = "default_mortgage_rate_pct")]
    pub mortgage_rate_pct: Decimal,
    #[serde(default = "default_mortgage_years")]
    pub mortgage_years: u32,
}

fn default_down_payment_ratio() -> Rate {
    dec!(0.20)
}

fn default_mortgage_rate_pct() -> Decimal {
    dec!(2.1)
}

fn default_mortgage_years() -> u32 {
    30
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingVerdict {
    Buy,
    Rent,
    Even,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyOutput {
    pub down_payment: Money,
    pub loan_amount: Money,
    pub monthly_mortgage: Money,
    pub final_home_value: Money,
    pub remaining_loan: Money,
    pub buy_net_worth: Money,
    /// Mortgage minus rent, invested monthly by the renter
    pub monthly_saving: Money,
    pub invested_down_payment: Money,
    pub invested_savings: Money,
    pub rent_net_worth: Money,
    pub verdict: HousingVerdict,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Net worth after `years` for a buyer versus a renter who invests the
/// down payment and any monthly saving over the mortgage.
pub fn compare_rent_vs_buy(input: &RentVsBuyInput) -> FinCalcResult<ComputationOutput<RentVsBuyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.home_price <= Decimal::ZERO {
        return Err(FinCalcError::invalid("home_price", "must be positive"));
    }
    if input.monthly_rent < Decimal::ZERO {
        return Err(FinCalcError::invalid("monthly_rent", "must not be negative"));
    }
    if input.years == 0 {
        return Err(FinCalcError::invalid("years", "must be at least 1"));
    }
    if input.down_payment_ratio < Decimal::ZERO || input.down_payment_ratio > Decimal::ONE {
        return Err(FinCalcError::invalid("down_payment_ratio", "must be in [0, 1]"));
    }
    if input.mortgage_rate_pct < Decimal::ZERO {
        return Err(FinCalcError::invalid("mortgage_rate_pct", "must not be negative"));
    }
    if input.mortgage_years == 0 {
        return Err(FinCalcError::invalid("mortgage_years", "must be at least 1"));
    }
    for (field, pct) in [
        ("invest_return_pct", input.invest_return_pct),
        ("home_appreciation_pct", input.home_appreciation_pct),
    ] {
        if pct <= Decimal::from(-100) {
            return Err(FinCalcError::invalid(field, "must be greater than -100%"));
        }
    }

    let down_payment = input.home_price * input.down_payment_ratio;
    let loan_amount = input.home_price - down_payment;
    let in_months = |years: u32, field: &str| {
        years
            .checked_mul(12)
            .ok_or_else(|| FinCalcError::invalid(field, "too many years to count in months"))
    };
    let mortgage_months = in_months(input.mortgage_years, "mortgage_years")?;
    let horizon_months = in_months(input.years, "years")?;
    let r_mortgage = monthly_rate(input.mortgage_rate_pct);

    let monthly_mortgage = level_payment(loan_amount, r_mortgage, mortgage_months)?;
    let remaining_loan = if horizon_months >= mortgage_months {
        Decimal::ZERO
    } else {
        remaining_balance(loan_amount, r_mortgage, monthly_mortgage, horizon_months)?
    };

    let final_home_value = input.home_price
        * compound_factor(pct_to_rate(input.home_appreciation_pct), input.years)?;
    let buy_net_worth = final_home_value - remaining_loan;

    let monthly_saving = (monthly_mortgage - input.monthly_rent).max(Decimal::ZERO);
    if monthly_saving.is_zero() {
        warnings.push("Rent is at or above the mortgage payment; renter has nothing extra to invest".into());
    }
    if input.years > input.mortgage_years {
        warnings.push(format!(
            "Horizon extends {} years past the mortgage term; buyer's freed cash flow not invested",
            input.years - input.mortgage_years
        ));
    }

    let invested_down_payment =
        down_payment * compound_factor(pct_to_rate(input.invest_return_pct), input.years)?;
    let invested_savings = annuity_future_value(
        monthly_saving,
        monthly_rate(input.invest_return_pct),
        horizon_months,
    )?;
    let rent_net_worth = invested_down_payment + invested_savings;

    let verdict = match buy_net_worth.cmp(&rent_net_worth) {
        std::cmp::Ordering::Greater => HousingVerdict::Buy,
        std::cmp::Ordering::Less => HousingVerdict::Rent,
        std::cmp::Ordering::Equal => HousingVerdict::Even,
    };

    let output = RentVsBuyOutput {
        down_payment,
        loan_amount,
        monthly_mortgage,
        final_home_value,
        remaining_loan,
        buy_net_worth,
        monthly_saving,
        invested_down_payment,
        invested_savings,
        rent_net_worth,
        verdict,
    };

    let assumptions = serde_json::json!({
        "down_payment_ratio": input.down_payment_ratio.to_string(),
        "mortgage_rate_pct": input.mortgage_rate_pct.to_string(),
        "mortgage_years": input.mortgage_years,
        "transaction_costs": "ignored",
        "rent_growth": "none",
    });

    Ok(with_metadata(
        "Home equity vs invested down payment plus monthly savings",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}
