use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use fincalc_core::tax::brackets::TaxSchedule;
use fincalc_core::FinCalcResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse the JSON input, run the calculator, serialise its envelope.
fn run_json<I, O>(input_json: &str, calculate: impl FnOnce(&I) -> FinCalcResult<O>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calculate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

fn parse_amount(field: &str, raw: &str) -> NapiResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| to_napi_error(format!("{field}: {e}")))
}

// ---------------------------------------------------------------------------
// Tax
// ---------------------------------------------------------------------------

/// Tax on a net income under the built-in schedule, as a decimal string.
#[napi]
pub fn tax_from_income(income: String) -> NapiResult<String> {
    let income = parse_amount("income", &income)?;
    let tax = TaxSchedule::taiwan_2025()
        .compute_tax(income)
        .map_err(to_napi_error)?;
    Ok(tax.to_string())
}

/// Smallest income producing `tax` under the built-in schedule.
#[napi]
pub fn income_from_tax(tax: String) -> NapiResult<String> {
    let tax = parse_amount("tax", &tax)?;
    let income = TaxSchedule::taiwan_2025()
        .compute_income_from_tax(tax)
        .map_err(to_napi_error)?;
    Ok(income.to_string())
}

#[napi]
pub fn overseas_quota(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::tax::overseas::calculate_overseas_quota)
}

#[napi]
pub fn dividend_income(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::tax::dividend::calculate_dividend_income)
}

// ---------------------------------------------------------------------------
// Lending, growth, returns
// ---------------------------------------------------------------------------

#[napi]
pub fn loan_payment(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::lending::annuity::calculate_loan)
}

#[napi]
pub fn compound_growth(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::growth::series::calculate_compound)
}

#[napi]
pub fn dca_growth(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::growth::series::calculate_dca)
}

#[napi]
pub fn plan_irr(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::returns::irr::calculate_irr)
}

// ---------------------------------------------------------------------------
// Structured products
// ---------------------------------------------------------------------------

#[napi]
pub fn barrier_note(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::structured_products::notes::analyze_barrier_note)
}

// ---------------------------------------------------------------------------
// Planning, trading, FX
// ---------------------------------------------------------------------------

#[napi]
pub fn fire_target(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::planning::retirement::calculate_fire)
}

#[napi]
pub fn insurance_gap(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::planning::protection::calculate_insurance_gap)
}

#[napi]
pub fn inflation_erosion(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::planning::inflation::calculate_inflation)
}

#[napi]
pub fn rent_vs_buy(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::planning::housing::compare_rent_vs_buy)
}

#[napi]
pub fn stock_trade_costs(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::trading::costs::calculate_trade_costs)
}

#[napi]
pub fn convert_currency(input_json: String) -> NapiResult<String> {
    run_json(&input_json, fincalc_core::fx::conversion::convert_currency)
}
