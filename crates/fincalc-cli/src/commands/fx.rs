use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::fx::conversion::{self, FxInput};
use fincalc_core::Currency;

use crate::input::{self, store::InputStore};

/// Arguments for currency conversion
#[derive(Args)]
pub struct FxArgs {
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Currency held (ISO code)
    #[arg(long)]
    pub from: Option<Currency>,

    /// Currency wanted (ISO code)
    #[arg(long)]
    pub to: Option<Currency>,

    /// Units of `to` per unit of `from`, overriding the built-in table
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_fx(args: FxArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "amount": args.amount,
        "from": args.from,
        "to": args.to,
        "custom_rate": args.rate,
    });
    let defaults = json!({ "amount": "1000", "from": "USD", "to": "TWD" });
    let fx_input: FxInput = input::resolve_input("fx", defaults, args.input.as_deref(), flags, store)?;
    let result = conversion::convert_currency(&fx_input)?;
    Ok(serde_json::to_value(result)?)
}
