use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fincalc_core::planning::housing::{self, RentVsBuyInput};
use fincalc_core::planning::inflation::{self, InflationInput};
use fincalc_core::planning::protection::{self, InsuranceGapInput};
use fincalc_core::planning::retirement::{self, FireInput};

use crate::input::{self, store::InputStore};

/// Arguments for the early-retirement target
#[derive(Args)]
pub struct FireArgs {
    /// Annual living expenses
    #[arg(long)]
    pub expense: Option<Decimal>,

    /// Expected monthly pension
    #[arg(long)]
    pub pension: Option<Decimal>,

    /// Investable assets today
    #[arg(long)]
    pub assets: Option<Decimal>,

    /// Safe withdrawal rate (e.g. 0.04)
    #[arg(long)]
    pub withdrawal_rate: Option<Decimal>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the life-cover gap
#[derive(Args)]
pub struct InsuranceGapArgs {
    /// Mortgage and other debt outstanding
    #[arg(long)]
    pub debt: Option<Decimal>,

    /// Yearly support the family needs
    #[arg(long)]
    pub family_support: Option<Decimal>,

    /// Years of support
    #[arg(long)]
    pub years: Option<u32>,

    /// Savings and investments on hand
    #[arg(long)]
    pub savings: Option<Decimal>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Erosion {
    /// (1 - i)^n
    Compound,
    /// 1 / (1 + i)^n
    Deflator,
}

impl Erosion {
    fn tag(self) -> &'static str {
        match self {
            Erosion::Compound => "erosion",
            Erosion::Deflator => "deflator",
        }
    }
}

/// Arguments for purchasing-power erosion
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct InflationArgs {
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Annual inflation in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long)]
    pub years: Option<u32>,

    #[arg(long, value_enum)]
    pub method: Option<Erosion>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the rent-versus-buy comparison
#[derive(Args)]
pub struct RentVsBuyArgs {
    #[arg(long)]
    pub home_price: Option<Decimal>,

    /// Monthly rent for an equivalent home
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Comparison horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Renter's investment return in percent
    #[arg(long)]
    pub invest_return: Option<Decimal>,

    /// Home price appreciation in percent
    #[arg(long)]
    pub appreciation: Option<Decimal>,

    /// Mortgage rate in percent
    #[arg(long)]
    pub mortgage_rate: Option<Decimal>,

    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_fire(args: FireArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "annual_expense": args.expense,
        "monthly_pension": args.pension,
        "current_assets": args.assets,
        "withdrawal_rate": args.withdrawal_rate,
    });
    let defaults = json!({
        "annual_expense": "600000",
        "monthly_pension": "20000",
        "current_assets": "2000000",
    });
    let fire_input: FireInput =
        input::resolve_input("fire", defaults, args.input.as_deref(), flags, store)?;
    let result = retirement::calculate_fire(&fire_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_insurance_gap(args: InsuranceGapArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "debt": args.debt,
        "annual_family_support": args.family_support,
        "support_years": args.years,
        "savings": args.savings,
    });
    let defaults = json!({
        "debt": "5000000",
        "annual_family_support": "500000",
        "support_years": 10,
        "savings": "1000000",
    });
    let gap_input: InsuranceGapInput =
        input::resolve_input("insurance_gap", defaults, args.input.as_deref(), flags, store)?;
    let result = protection::calculate_insurance_gap(&gap_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_inflation(args: InflationArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "amount": args.amount,
        "inflation_rate_pct": args.rate,
        "years": args.years,
        "method": args.method.map(Erosion::tag),
    });
    let defaults = json!({
        "amount": "1000000",
        "inflation_rate_pct": "3",
        "years": 20,
        "method": "erosion",
    });
    let inf_input: InflationInput =
        input::resolve_input("inflation", defaults, args.input.as_deref(), flags, store)?;
    let result = inflation::calculate_inflation(&inf_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rent_vs_buy(args: RentVsBuyArgs, store: &mut dyn InputStore) -> Result<Value, Box<dyn std::error::Error>> {
    let flags = json!({
        "home_price": args.home_price,
        "monthly_rent": args.rent,
        "years": args.years,
        "invest_return_pct": args.invest_return,
        "home_appreciation_pct": args.appreciation,
        "mortgage_rate_pct": args.mortgage_rate,
    });
    let defaults = json!({
        "home_price": "15000000",
        "monthly_rent": "30000",
        "years": 20,
        "invest_return_pct": "6",
        "home_appreciation_pct": "2",
    });
    let rvb_input: RentVsBuyInput =
        input::resolve_input("rent_vs_buy", defaults, args.input.as_deref(), flags, store)?;
    let result = housing::compare_rent_vs_buy(&rvb_input)?;
    Ok(serde_json::to_value(result)?)
}
