use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::lending::annuity::{self, LoanInput};

use crate::input::{self, store::InputStore};

/// Arguments for mortgage / loan instalments
#[derive(Args)]
pub struct LoanArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate in percent (e.g. 2.1)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Interest-only grace period in years
    #[arg(long)]
    pub grace_years: Option<u32>,

    /// Include the month-by-month schedule
    #[arg(long, overrides_with = "no_schedule")]
    pub schedule: bool,

    /// Leave the schedule out, even if a stored input asked for it
    #[arg(long, overrides_with = "schedule")]
    pub no_schedule: bool,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

fn years_to_months(years: Option<u32>, flag: &str) -> Result<Option<u32>, String> {
    years
        .map(|y| y.checked_mul(12).ok_or(format!("--{flag} {y} is too many years")))
        .transpose()
}

fn schedule_flag(schedule: bool, no_schedule: bool) -> Option<bool> {
    match (schedule, no_schedule) {
        (_, true) => Some(false),
        (true, false) => Some(true),
        (false, false) => None,
    }
}

pub fn run_loan(args: LoanArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "principal": args.principal,
        "annual_rate_pct": args.rate,
        "total_months": years_to_months(args.years, "years")?,
        "grace_months": years_to_months(args.grace_years, "grace-years")?,
        "include_schedule": schedule_flag(args.schedule, args.no_schedule),
    });
    let defaults = json!({
        "principal": "10000000",
        "annual_rate_pct": "2.1",
        "total_months": 360,
        "grace_months": 0,
    });
    let loan_input: LoanInput =
        input::resolve_input("loan", defaults, args.input.as_deref(), flags, store)?;
    let result = annuity::calculate_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}
