use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::structured_products::notes::{self, BarrierNoteInput};

use crate::input::{self, store::InputStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Observation {
    Continuous,
    TerminalOnly,
    None,
}

impl Observation {
    fn tag(self) -> &'static str {
        match self {
            Observation::Continuous => "continuous",
            Observation::TerminalOnly => "terminal_only",
            Observation::None => "none",
        }
    }
}

/// Arguments for fixed-coupon / equity-linked note analysis
#[derive(Args)]
pub struct BarrierNoteArgs {
    /// Amount invested
    #[arg(long)]
    pub notional: Option<Decimal>,

    /// Underlying price at trade date
    #[arg(long)]
    pub reference_price: Option<Decimal>,

    /// Knock-out barrier, % of reference
    #[arg(long)]
    pub ko: Option<Decimal>,

    /// Strike, % of reference
    #[arg(long)]
    pub strike: Option<Decimal>,

    /// Knock-in barrier, % of reference
    #[arg(long)]
    pub ki: Option<Decimal>,

    /// Annual coupon in percent
    #[arg(long)]
    pub coupon: Option<Decimal>,

    /// Tenor in months
    #[arg(long)]
    pub months: Option<u32>,

    #[arg(long, value_enum)]
    pub observation: Option<Observation>,

    /// Underlying price at maturity, for an explicit scenario
    #[arg(long)]
    pub final_price: Option<Decimal>,

    /// The KI barrier was breached during the term
    #[arg(long, requires = "final_price")]
    pub touched_ki: bool,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_barrier_note(args: BarrierNoteArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = args.final_price.map(|p| json!({ "final_price": p, "touched_ki": args.touched_ki }));
    let flags = json!({
        "notional": args.notional,
        "reference_price": args.reference_price,
        "ko_pct": args.ko,
        "strike_pct": args.strike,
        "ki_pct": args.ki,
        "coupon_annual_pct": args.coupon,
        "term_months": args.months,
        "observation_mode": args.observation.map(Observation::tag),
        "scenario": scenario,
    });
    let defaults = json!({
        "notional": "100000",
        "reference_price": "100",
        "ko_pct": "100",
        "strike_pct": "100",
        "ki_pct": "65",
        "coupon_annual_pct": "8",
        "term_months": 12,
        "observation_mode": "continuous",
    });
    let note_input: BarrierNoteInput =
        input::resolve_input("barrier_note", defaults, args.input.as_deref(), flags, store)?;
    let result = notes::analyze_barrier_note(&note_input)?;
    Ok(serde_json::to_value(result)?)
}
