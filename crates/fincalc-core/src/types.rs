use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FinCalcError;

/// All monetary values and prices. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Inputs that take percentages
/// carry a `_pct` suffix instead.
pub type Rate = Decimal;

/// Year counts, possibly fractional
pub type Years = Decimal;

/// ISO currency code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    TWD,
    USD,
    JPY,
    EUR,
    CNY,
    AUD,
    KRW,
    Other(String),
}

impl FromStr for Currency {
    type Err = FinCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FinCalcError::invalid(
                "currency",
                format!("'{s}' is not a three-letter currency code"),
            ));
        }
        Ok(match code.as_str() {
            "TWD" => Currency::TWD,
            "USD" => Currency::USD,
            "JPY" => Currency::JPY,
            "EUR" => Currency::EUR,
            "CNY" => Currency::CNY,
            "AUD" => Currency::AUD,
            "KRW" => Currency::KRW,
            _ => Currency::Other(code),
        })
    }
}

impl TryFrom<String> for Currency {
    type Error = FinCalcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::TWD => write!(f, "TWD"),
            Currency::USD => write!(f, "USD"),
            Currency::JPY => write!(f, "JPY"),
            Currency::EUR => write!(f, "EUR"),
            Currency::CNY => write!(f, "CNY"),
            Currency::AUD => write!(f, "AUD"),
            Currency::KRW => write!(f, "KRW"),
            Currency::Other(code) => write!(f, "{code}"),
        }
    }
}

/// A single cash flow at a whole-period offset from the start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub period: u32,
    /// Negative for contributions, positive for payouts
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CashFlow {
    pub fn new(period: u32, amount: Money) -> Self {
        CashFlow {
            period,
            amount,
            label: None,
        }
    }
}

/// One point of a chartable series, ordered by `index`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub index: u32,
    pub value: Money,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
