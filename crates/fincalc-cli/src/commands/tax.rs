use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::tax::dividend::{self, DividendInput};
use fincalc_core::tax::overseas::{self, OverseasQuotaInput};

use crate::input::{self, store::InputStore};

/// Arguments for the overseas-income quota calculation
#[derive(Args)]
pub struct TaxArgs {
    /// Net taxable income
    #[arg(long, conflicts_with = "tax")]
    pub income: Option<Decimal>,

    /// Regular income tax payable (income is derived from it)
    #[arg(long)]
    pub tax: Option<Decimal>,

    /// AMT basic exemption
    #[arg(long)]
    pub amt_exemption: Option<Decimal>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for dividend income after the supplementary premium
#[derive(Args)]
pub struct DividendArgs {
    /// Shares held
    #[arg(long)]
    pub shares: Option<Decimal>,

    /// Cash dividend per share for the year
    #[arg(long, alias = "dps")]
    pub dividend_per_share: Option<Decimal>,

    /// Payments per year (1, 2, 4 or 12)
    #[arg(long)]
    pub frequency: Option<u32>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_tax(args: TaxArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let mut flags = match (args.income, args.tax) {
        (Some(income), _) => json!({ "basis": "income", "amount": income }),
        (None, Some(tax)) => json!({ "basis": "tax", "amount": tax }),
        (None, None) => json!({}),
    };
    flags["amt_exemption"] = json!(args.amt_exemption);

    let defaults = json!({ "basis": "income", "amount": "1500000" });
    let tax_input: OverseasQuotaInput =
        input::resolve_input("tax", defaults, args.input.as_deref(), flags, store)?;
    let result = overseas::calculate_overseas_quota(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_dividend(args: DividendArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "shares": args.shares,
        "dividend_per_share": args.dividend_per_share,
        "payments_per_year": args.frequency,
    });
    let defaults = json!({ "shares": "10000", "dividend_per_share": "1.5", "payments_per_year": 1 });
    let div_input: DividendInput =
        input::resolve_input("dividend", defaults, args.input.as_deref(), flags, store)?;
    let result = dividend::calculate_dividend_income(&div_input)?;
    Ok(serde_json::to_value(result)?)
}
