use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::returns::irr::{self, IrrInput};

use crate::input::{self, store::InputStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum IrrMode {
    /// One deposit, one payout
    LumpSum,
    /// Level annual premiums, one payout
    Scheduled,
    /// Arbitrary flows from --input or stdin
    CashFlows,
}

impl IrrMode {
    fn tag(self) -> &'static str {
        match self {
            IrrMode::LumpSum => "lump_sum",
            IrrMode::Scheduled => "scheduled",
            IrrMode::CashFlows => "cash_flows",
        }
    }
}

/// Arguments for the annualised return of a savings plan or policy
#[derive(Args)]
pub struct IrrArgs {
    #[arg(long, value_enum)]
    pub mode: Option<IrrMode>,

    /// Lump sum: amount deposited
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Lump sum: amount received at the end
    #[arg(long)]
    pub final_value: Option<Decimal>,

    /// Lump sum: holding period in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Scheduled: annual premium
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Scheduled: number of annual premiums
    #[arg(long)]
    pub pay_years: Option<u32>,

    /// Scheduled: payout amount
    #[arg(long)]
    pub final_payout: Option<Decimal>,

    /// Scheduled: year of the payout
    #[arg(long)]
    pub wait_years: Option<u32>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_irr(args: IrrArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "mode": args.mode.map(IrrMode::tag),
        "principal": args.principal,
        "final_value": args.final_value,
        "years": args.years,
        "payment": args.payment,
        "pay_years": args.pay_years,
        "final_payout": args.final_payout,
        "wait_years": args.wait_years,
    });
    // Both shapes' fields are present; the tag picks which ones are read
    let defaults = json!({
        "mode": "lump_sum",
        "principal": "1000000",
        "final_value": "1200000",
        "years": "6",
        "payment": "100000",
        "pay_years": 6,
        "final_payout": "700000",
        "wait_years": 10,
    });
    let irr_input: IrrInput =
        input::resolve_input("irr", defaults, args.input.as_deref(), flags, store)?;
    let result = irr::calculate_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}
