use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// How the knock-in / knock-out barriers are monitored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationMode {
    /// Barriers observed daily over the life of the note
    #[default]
    Continuous,
    /// Knock-in checked only at maturity
    TerminalOnly,
    /// No knock-in feature; settlement depends on the strike alone
    #[serde(rename = "none")]
    Unobserved,
}

impl std::fmt::Display for ObservationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservationMode::Continuous => write!(f, "Continuous (daily close)"),
            ObservationMode::TerminalOnly => write!(f, "At maturity only (European)"),
            ObservationMode::Unobserved => write!(f, "No knock-in"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityOutcome {
    KnockedOut,
    SettledAboveStrike,
    DeliveredUnderlying,
}

impl std::fmt::Display for MaturityOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaturityOutcome::KnockedOut => write!(f, "Knocked out: principal redeemed early"),
            MaturityOutcome::SettledAboveStrike => write!(f, "Principal repaid in cash"),
            MaturityOutcome::DeliveredUnderlying => write!(f, "Underlying delivered at strike"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierSet {
    pub reference_price: Money,
    pub ko_pct: Decimal,
    pub strike_pct: Decimal,
    pub ki_pct: Decimal,
    #[serde(default)]
    pub observation_mode: ObservationMode,
}

impl BarrierSet {
    pub fn prices(&self) -> FinCalcResult<BarrierPrices> {
        barrier_prices(self.reference_price, self.ko_pct, self.strike_pct, self.ki_pct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarrierPrices {
    pub ko: Money,
    pub strike: Money,
    pub ki: Money,
}

// ---------------------------------------------------------------------------
// Barrier arithmetic
// ---------------------------------------------------------------------------

fn validate_reference(reference_price: Money) -> FinCalcResult<()> {
    if reference_price <= Decimal::ZERO {
        return Err(FinCalcError::invalid("reference_price", "must be positive"));
    }
    Ok(())
}

fn validate_pct(field: &str, pct: Decimal) -> FinCalcResult<()> {
    if pct < Decimal::ZERO {
        return Err(FinCalcError::invalid(field, "must not be negative"));
    }
    Ok(())
}

/// Barrier levels as prices: `reference_price × pct / 100`.
pub fn barrier_prices(
    reference_price: Money,
    ko_pct: Decimal,
    strike_pct: Decimal,
    ki_pct: Decimal,
) -> FinCalcResult<BarrierPrices> {
    validate_reference(reference_price)?;
    validate_pct("ko_pct", ko_pct)?;
    validate_pct("strike_pct", strike_pct)?;
    validate_pct("ki_pct", ki_pct)?;

    Ok(BarrierPrices {
        ko: reference_price * ko_pct / dec!(100),
        strike: reference_price * strike_pct / dec!(100),
        ki: reference_price * ki_pct / dec!(100),
    })
}

/// Final price at which coupons collected over the term exactly offset a
/// delivery loss at strike. Floors at zero once coupons exceed the notional.
pub fn break_even_price(
    strike_pct: Decimal,
    reference_price: Money,
    coupon_annual_pct: Decimal,
    term_months: u32,
) -> FinCalcResult<Money> {
    validate_reference(reference_price)?;
    validate_pct("strike_pct", strike_pct)?;
    validate_pct("coupon_annual_pct", coupon_annual_pct)?;

    let strike = reference_price * strike_pct / dec!(100);
    let coupon_fraction = coupon_annual_pct / dec!(100) * Decimal::from(term_months) / dec!(12);
    Ok((strike * (Decimal::ONE - coupon_fraction)).max(Decimal::ZERO))
}

/// Settlement branch at maturity. Pure classification; P&L is derived
/// separately from coupon income and the strike-to-final difference.
pub fn classify_maturity_outcome(
    mode: ObservationMode,
    touched_ki: bool,
    final_price: Money,
    ko: Money,
    strike: Money,
) -> MaturityOutcome {
    if mode == ObservationMode::Continuous && final_price >= ko {
        return MaturityOutcome::KnockedOut;
    }
    let settles_in_cash = match mode {
        ObservationMode::Unobserved => final_price >= strike,
        ObservationMode::Continuous | ObservationMode::TerminalOnly => {
            !touched_ki || final_price >= strike
        }
    };
    if settles_in_cash {
        MaturityOutcome::SettledAboveStrike
    } else {
        MaturityOutcome::DeliveredUnderlying
    }
}

// ---------------------------------------------------------------------------
// Note analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaturityScenarioInput {
    pub final_price: Money,
    /// Whether the KI barrier was breached during the observation window
    #[serde(default)]
    pub touched_ki: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarrierNoteInput {
    pub notional: Money,
    pub reference_price: Money,
    #[serde(default = "default_hundred")]
    pub ko_pct: Decimal,
    #[serde(default = "default_hundred")]
    pub strike_pct: Decimal,
    pub ki_pct: Decimal,
    pub coupon_annual_pct: Decimal,
    pub term_months: u32,
    #[serde(default)]
    pub observation_mode: ObservationMode,
    #[serde(default)]
    pub scenario: Option<MaturityScenarioInput>,
}

fn default_hundred() -> Decimal {
    dec!(100)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotePayoff {
    pub final_price: Money,
    /// Final price relative to the reference price
    pub underlying_return: Rate,
    pub touched_ki: bool,
    pub outcome: MaturityOutcome,
    pub coupon_income: Money,
    /// Cash repaid, or market value of the delivered shares
    pub redemption_value: Money,
    pub pnl: Money,
    pub note_return: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarrierNoteOutput {
    pub barriers: BarrierPrices,
    /// Drop from the reference price before KI is breached
    pub ki_buffer: Rate,
    pub break_even_price: Money,
    /// Drop from the reference price to break even
    pub break_even_drop: Rate,
    pub total_coupon: Money,
    pub shares_if_delivered: Decimal,
    pub observation_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<NotePayoff>,
    pub payoff_scenarios: Vec<NotePayoff>,
}

/// Final-price moves relative to the reference price for the payoff grid.
fn standard_scenario_returns() -> Vec<Rate> {
    vec![
        dec!(-0.50),
        dec!(-0.35),
        dec!(-0.20),
        dec!(-0.10),
        dec!(0.00),
        dec!(0.10),
        dec!(0.20),
    ]
}

fn payoff_at(
    input: &BarrierNoteInput,
    barriers: &BarrierPrices,
    total_coupon: Money,
    final_price: Money,
    touched_ki: bool,
) -> NotePayoff {
    let outcome = classify_maturity_outcome(
        input.observation_mode,
        touched_ki,
        final_price,
        barriers.ko,
        barriers.strike,
    );
    let redemption_value = match outcome {
        MaturityOutcome::KnockedOut | MaturityOutcome::SettledAboveStrike => input.notional,
        MaturityOutcome::DeliveredUnderlying => input.notional / barriers.strike * final_price,
    };
    let pnl = redemption_value - input.notional + total_coupon;

    NotePayoff {
        final_price,
        underlying_return: final_price / input.reference_price - Decimal::ONE,
        touched_ki,
        outcome,
        coupon_income: total_coupon,
        redemption_value,
        pnl,
        note_return: pnl / input.notional,
    }
}

fn validate_note(input: &BarrierNoteInput) -> FinCalcResult<()> {
    if input.notional <= Decimal::ZERO {
        return Err(FinCalcError::invalid("notional", "must be positive"));
    }
    if input.strike_pct <= Decimal::ZERO {
        return Err(FinCalcError::invalid("strike_pct", "must be positive"));
    }
    if input.term_months == 0 {
        return Err(FinCalcError::invalid("term_months", "must be positive"));
    }
    if input.ki_pct > input.strike_pct {
        return Err(FinCalcError::invalid(
            "ki_pct",
            "knock-in barrier must not sit above the strike",
        ));
    }
    if let Some(ref s) = input.scenario {
        if s.final_price < Decimal::ZERO {
            return Err(FinCalcError::invalid("final_price", "must not be negative"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Barrier levels, break-even and payoff profile of a fixed-coupon note
/// (FCN / ELN) on a single underlying.
pub fn analyze_barrier_note(
    input: &BarrierNoteInput,
) -> FinCalcResult<ComputationOutput<BarrierNoteOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_note(input)?;
    let barriers = barrier_prices(input.reference_price, input.ko_pct, input.strike_pct, input.ki_pct)?;
    let break_even = break_even_price(
        input.strike_pct,
        input.reference_price,
        input.coupon_annual_pct,
        input.term_months,
    )?;

    let total_coupon = input.notional * input.coupon_annual_pct / dec!(100)
        * Decimal::from(input.term_months)
        / dec!(12);

    if break_even.is_zero() {
        warnings.push("Coupons over the term exceed the notional; break-even floored at zero".into());
    }
    if input.observation_mode == ObservationMode::Continuous {
        warnings.push(
            "Knock-out assumed at maturity; an earlier knock-out would cut the coupon stream short"
                .into(),
        );
    }
    if input.ko_pct < input.strike_pct {
        warnings.push("Knock-out barrier sits below the strike".into());
    }

    let scenario = input.scenario.as_ref().map(|s| {
        payoff_at(input, &barriers, total_coupon, s.final_price, s.touched_ki)
    });

    let payoff_scenarios = standard_scenario_returns()
        .into_iter()
        .map(|move_pct| {
            let final_price = input.reference_price * (Decimal::ONE + move_pct);
            // Without a path, assume the barrier was touched only if the close is below it
            let touched_ki = final_price < barriers.ki;
            payoff_at(input, &barriers, total_coupon, final_price, touched_ki)
        })
        .collect();

    let output = BarrierNoteOutput {
        ki_buffer: Decimal::ONE - barriers.ki / input.reference_price,
        break_even_drop: Decimal::ONE - break_even / input.reference_price,
        break_even_price: break_even,
        total_coupon,
        shares_if_delivered: input.notional / barriers.strike,
        observation_mode: input.observation_mode.to_string(),
        barriers,
        scenario,
        payoff_scenarios,
    };

    let assumptions = serde_json::json!({
        "notional": input.notional.to_string(),
        "reference_price": input.reference_price.to_string(),
        "ko_pct": input.ko_pct.to_string(),
        "strike_pct": input.strike_pct.to_string(),
        "ki_pct": input.ki_pct.to_string(),
        "coupon_annual_pct": input.coupon_annual_pct.to_string(),
        "term_months": input.term_months,
        "observation_mode": input.observation_mode,
        "coupon_accrual": "simple, full term",
    });

    Ok(with_metadata(
        "Barrier levels as % of reference; delivery at strike below KI",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
