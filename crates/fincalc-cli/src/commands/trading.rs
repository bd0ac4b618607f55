use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::trading::costs::{self, StockTradeInput};

use crate::input::{self, store::InputStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Security {
    Stock,
    DayTrade,
    Etf,
    Bond,
}

impl Security {
    fn tag(self) -> &'static str {
        match self {
            Security::Stock => "stock",
            Security::DayTrade => "day_trade",
            Security::Etf => "etf",
            Security::Bond => "bond",
        }
    }
}

/// Arguments for round-trip trading costs
#[derive(Args)]
pub struct StockTradeArgs {
    #[arg(long)]
    pub buy_price: Option<Decimal>,

    #[arg(long)]
    pub sell_price: Option<Decimal>,

    #[arg(long)]
    pub shares: Option<Decimal>,

    #[arg(long = "type", value_enum)]
    pub security_type: Option<Security>,

    /// Broker discount, percent of full commission (60 = 40% off)
    #[arg(long)]
    pub discount: Option<Decimal>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_stock_trade(args: StockTradeArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "buy_price": args.buy_price,
        "sell_price": args.sell_price,
        "shares": args.shares,
        "security_type": args.security_type.map(Security::tag),
        "fee_discount_pct": args.discount,
    });
    let defaults = json!({
        "buy_price": "100",
        "sell_price": "110",
        "shares": "1000",
        "security_type": "stock",
        "fee_discount_pct": "60",
    });
    let trade_input: StockTradeInput =
        input::resolve_input("stock_trade", defaults, args.input.as_deref(), flags, store)?;
    let result = costs::calculate_trade_costs(&trade_input)?;
    Ok(serde_json::to_value(result)?)
}
