use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, Currency, Money};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Rate sources
// ---------------------------------------------------------------------------

/// Anything that can price one unit of a currency in the table's base currency.
pub trait RateSource {
    fn base_currency(&self) -> Currency;

    /// Base-currency value of one unit of `currency`, if known
    fn base_value(&self, currency: &Currency) -> Option<Decimal>;
}

#[derive(Deserialize)]
struct RateTableTerms {
    base: Currency,
    rates: BTreeMap<Currency, Decimal>,
}

/// Fixed quotes against a single base currency. Every quote is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RateTableTerms")]
pub struct StaticRateTable {
    base: Currency,
    rates: BTreeMap<Currency, Decimal>,
}

impl StaticRateTable {
    pub fn new(base: Currency, rates: BTreeMap<Currency, Decimal>) -> FinCalcResult<Self> {
        if let Some((c, _)) = rates.iter().find(|(_, v)| **v <= Decimal::ZERO) {
            return Err(FinCalcError::invalid("rates", format!("{c} quote must be positive")));
        }
        Ok(StaticRateTable { base, rates })
    }

    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn rates(&self) -> &BTreeMap<Currency, Decimal> {
        &self.rates
    }
}

impl TryFrom<RateTableTerms> for StaticRateTable {
    type Error = FinCalcError;

    fn try_from(t: RateTableTerms) -> Result<Self, Self::Error> {
        StaticRateTable::new(t.base, t.rates)
    }
}

impl Default for StaticRateTable {
    /// Indicative TWD quotes
    fn default() -> Self {
        let rates = BTreeMap::from([
            (Currency::TWD, dec!(1)),
            (Currency::USD, dec!(32.5)),
            (Currency::JPY, dec!(0.22)),
            (Currency::EUR, dec!(35.2)),
            (Currency::CNY, dec!(4.5)),
            (Currency::AUD, dec!(21.5)),
            (Currency::KRW, dec!(0.024)),
        ]);
        StaticRateTable {
            base: Currency::TWD,
            rates,
        }
    }
}

impl RateSource for StaticRateTable {
    fn base_currency(&self) -> Currency {
        self.base.clone()
    }

    fn base_value(&self, currency: &Currency) -> Option<Decimal> {
        if *currency == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(currency).copied()
    }
}

/// Units of `to` per unit of `from`.
pub fn cross_rate(source: &impl RateSource, from: &Currency, to: &Currency) -> FinCalcResult<Decimal> {
    let quote = |c: &Currency| {
        source
            .base_value(c)
            .ok_or_else(|| FinCalcError::InsufficientData(format!("no quote for {c}")))
    };
    let from_value = quote(from)?;
    let to_value = quote(to)?;
    if to_value.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: format!("cross rate into {to}"),
        });
    }
    Ok(from_value / to_value)
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxInput {
    pub amount: Money,
    pub from: Currency,
    pub to: Currency,
    /// Overrides the table-derived rate
    #[serde(default)]
    pub custom_rate: Option<Decimal>,
    /// Replaces the built-in quote table
    #[serde(default)]
    pub rates: Option<StaticRateTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxOutput {
    pub converted: Money,
    pub rate: Decimal,
    pub inverse_rate: Decimal,
    pub rate_source: String,
}

pub fn convert_currency(input: &FxInput) -> FinCalcResult<ComputationOutput<FxOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.amount < Decimal::ZERO {
        return Err(FinCalcError::invalid("amount", "must not be negative"));
    }

    let table = input.rates.clone().unwrap_or_default();
    let (rate, rate_source) = match input.custom_rate {
        Some(r) if r <= Decimal::ZERO => {
            return Err(FinCalcError::invalid("custom_rate", "must be positive"));
        }
        Some(r) => (r, "custom".to_string()),
        None => (
            cross_rate(&table, &input.from, &input.to)?,
            format!("static table ({} base)", table.base_currency()),
        ),
    };
    if input.from == input.to && rate != Decimal::ONE {
        warnings.push("Same-currency conversion with a rate other than 1".into());
    }

    let converted = input
        .amount
        .checked_mul(rate)
        .ok_or_else(|| FinCalcError::NumericOverflow {
            context: format!("{} × {rate}", input.amount),
        })?;
    let inverse_rate = Decimal::ONE
        .checked_div(rate)
        .ok_or_else(|| FinCalcError::DivisionByZero {
            context: format!("inverse of rate {rate}"),
        })?;

    let output = FxOutput {
        converted: converted.round_dp(2),
        rate,
        inverse_rate,
        rate_source,
    };

    let assumptions = serde_json::json!({
        "from": input.from,
        "to": input.to,
        "quotes": "indicative, no bid/ask spread",
    });

    Ok(with_metadata(
        "Cross rate through the table's base currency",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}
