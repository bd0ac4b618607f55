mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::fx::FxArgs;
use commands::growth::{CompoundArgs, DcaArgs};
use commands::lending::LoanArgs;
use commands::planning::{FireArgs, InflationArgs, InsuranceGapArgs, RentVsBuyArgs};
use commands::returns::IrrArgs;
use commands::structured_products::BarrierNoteArgs;
use commands::tax::{DividendArgs, TaxArgs};
use commands::trading::StockTradeArgs;
use input::store::{InputStore, JsonFileStore, MemoryStore};

/// Personal-finance calculations with decimal precision
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Personal-finance calculations with decimal precision",
    long_about = "A CLI for everyday personal-finance questions: income tax and the \
                  overseas-income quota, mortgage instalments with grace periods, \
                  compounding and monthly savings plans, policy IRR, and barrier \
                  (FCN / ELN) notes. Inputs layer built-in defaults, the last stored \
                  input, an --input file or stdin, and flags."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Remember inputs between runs in this JSON file
    #[arg(long, global = true)]
    state_file: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Income tax and overseas income allowed before AMT applies
    Tax(TaxArgs),
    /// Loan instalments with an optional interest-only grace period
    Loan(LoanArgs),
    /// Lump-sum compounding, optionally against a second rate
    Compound(CompoundArgs),
    /// Monthly savings plan (dollar-cost averaging)
    Dca(DcaArgs),
    /// Annualised IRR of a savings plan or policy
    Irr(IrrArgs),
    /// Barrier levels, break-even and payoff grid of an FCN / ELN
    BarrierNote(BarrierNoteArgs),
    /// Dividend income after the supplementary health premium
    Dividend(DividendArgs),
    /// Round-trip brokerage and transaction tax of a trade
    StockTrade(StockTradeArgs),
    /// Financial-independence target and progress
    Fire(FireArgs),
    /// Life-cover gap by the needs approach
    InsuranceGap(InsuranceGapArgs),
    /// Purchasing power lost to inflation
    Inflation(InflationArgs),
    /// Currency conversion
    Fx(FxArgs),
    /// Net worth of buying versus renting and investing
    RentVsBuy(RentVsBuyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "fincalc=debug,fincalc_core=debug"
    } else {
        "fincalc=warn,fincalc_core=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn open_store(state_file: Option<&str>) -> Result<Box<dyn InputStore>, Box<dyn std::error::Error>> {
    Ok(match state_file {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(MemoryStore::default()),
    })
}

fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let mut store = open_store(cli.state_file.as_deref())?;
    let store = store.as_mut();

    match cli.command {
        Commands::Tax(args) => commands::tax::run_tax(args, store),
        Commands::Loan(args) => commands::lending::run_loan(args, store),
        Commands::Compound(args) => commands::growth::run_compound(args, store),
        Commands::Dca(args) => commands::growth::run_dca(args, store),
        Commands::Irr(args) => commands::returns::run_irr(args, store),
        Commands::BarrierNote(args) => commands::structured_products::run_barrier_note(args, store),
        Commands::Dividend(args) => commands::tax::run_dividend(args, store),
        Commands::StockTrade(args) => commands::trading::run_stock_trade(args, store),
        Commands::Fire(args) => commands::planning::run_fire(args, store),
        Commands::InsuranceGap(args) => commands::planning::run_insurance_gap(args, store),
        Commands::Inflation(args) => commands::planning::run_inflation(args, store),
        Commands::Fx(args) => commands::fx::run_fx(args, store),
        Commands::RentVsBuy(args) => commands::planning::run_rent_vs_buy(args, store),
        Commands::Version => Ok(serde_json::json!({
            "name": "fincalc",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = cli.output.clone();

    match run(cli) {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
