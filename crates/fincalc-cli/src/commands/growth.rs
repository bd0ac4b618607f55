use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::growth::series::{self, CompoundInput, DcaInput};

use crate::input::{self, store::InputStore};

/// Arguments for lump-sum compounding
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompoundArgs {
    /// Starting principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual return in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub years: Option<u32>,

    /// Second annual rate in percent to compare against
    #[arg(long)]
    pub compare_rate: Option<Decimal>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a monthly savings plan
#[derive(Args)]
pub struct DcaArgs {
    /// Monthly contribution
    #[arg(long)]
    pub monthly: Option<Decimal>,

    /// Annual return in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub years: Option<u32>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compound(args: CompoundArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "principal": args.principal,
        "annual_rate_pct": args.rate,
        "years": args.years,
        "compare_rate_pct": args.compare_rate,
    });
    let defaults = json!({
        "principal": "100000",
        "annual_rate_pct": "6",
        "years": 20,
        "compare_rate_pct": "1.7",
    });
    let compound_input: CompoundInput =
        input::resolve_input("compound", defaults, args.input.as_deref(), flags, store)?;
    let result = series::calculate_compound(&compound_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_dca(args: DcaArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "monthly_amount": args.monthly,
        "annual_rate_pct": args.rate,
        "years": args.years,
    });
    let defaults = json!({ "monthly_amount": "10000", "annual_rate_pct": "6", "years": 20 });
    let dca_input: DcaInput =
        input::resolve_input("dca", defaults, args.input.as_deref(), flags, store)?;
    let result = series::calculate_dca(&dca_input)?;
    Ok(serde_json::to_value(result)?)
}
