use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::FinCalcError;
use crate::types::{CashFlow, Money, Rate, Years};
use crate::FinCalcResult;

/// Lower end of the default IRR search bracket (-99%)
pub const IRR_BRACKET_LOW: Rate = dec!(-0.99);
/// Upper end of the default IRR search bracket (+100%)
pub const IRR_BRACKET_HIGH: Rate = dec!(1.00);
pub const MAX_BISECTION_ITERATIONS: u32 = 50;
/// Bisection stops early once |NPV| falls below one currency unit
pub const NPV_TOLERANCE: Money = dec!(1);

/// Percentage (2.1) to decimal rate (0.021)
pub fn pct_to_rate(pct: Decimal) -> Rate {
    pct / dec!(100)
}

/// Annual percentage to the equivalent nominal monthly rate
pub fn monthly_rate(annual_rate_pct: Decimal) -> Rate {
    annual_rate_pct / dec!(100) / dec!(12)
}

/// Round to the nearest whole currency unit, halves away from zero.
pub fn round_to_unit(value: Money) -> Money {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// (1 + rate)^periods
pub fn compound_factor(rate: Rate, periods: u32) -> FinCalcResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| FinCalcError::NumericOverflow {
            context: format!("compound factor (1 + {rate})^{periods}"),
        })
}

/// Level payment that amortises `principal` over `nper` periods (unrounded).
/// A zero rate degenerates to straight-line repayment.
pub fn level_payment(principal: Money, rate: Rate, nper: u32) -> FinCalcResult<Money> {
    if nper == 0 {
        return Err(FinCalcError::invalid(
            "nper",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let annuity_factor = factor - Decimal::ONE;
    if annuity_factor.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(annuity_factor))
        .ok_or_else(|| FinCalcError::NumericOverflow {
            context: "level payment".into(),
        })
}

/// Future value of `nper` end-of-period payments. Zero rate is the plain sum.
pub fn annuity_future_value(payment: Money, rate: Rate, nper: u32) -> FinCalcResult<Money> {
    if nper == 0 {
        return Ok(Decimal::ZERO);
    }
    if rate.is_zero() {
        return Ok(payment * Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    payment
        .checked_mul(factor - Decimal::ONE)
        .and_then(|v| v.checked_div(rate))
        .ok_or_else(|| FinCalcError::NumericOverflow {
            context: "annuity future value".into(),
        })
}

/// Outstanding loan balance after `paid` level payments, never below zero.
pub fn remaining_balance(
    principal: Money,
    rate: Rate,
    payment: Money,
    paid: u32,
) -> FinCalcResult<Money> {
    let grown = principal * compound_factor(rate, paid)?;
    let repaid = annuity_future_value(payment, rate, paid)?;
    Ok((grown - repaid).max(Decimal::ZERO))
}

/// Net Present Value of cash flows indexed by period
pub fn npv(rate: Rate, flows: &[CashFlow]) -> FinCalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(FinCalcError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let mut result = Decimal::ZERO;
    for cf in flows {
        let discount = compound_factor(rate, cf.period)?;
        if discount.is_zero() {
            return Err(FinCalcError::DivisionByZero {
                context: format!("NPV discount factor at period {}", cf.period),
            });
        }
        result += cf
            .amount
            .checked_div(discount)
            .ok_or_else(|| FinCalcError::NumericOverflow {
                context: format!("NPV term at period {}", cf.period),
            })?;
    }

    Ok(result)
}

/// Cash flows compounded forward to `horizon` at a non-positive rate. Shares
/// its sign with the NPV at the same rate, but stays finite near -100%.
fn horizon_value(rate: Rate, flows: &[CashFlow], horizon: u32) -> FinCalcResult<Money> {
    let mut total = Decimal::ZERO;
    for cf in flows {
        // growth factor is at most 1 here; a failed power has underflowed
        let factor = (Decimal::ONE + rate)
            .checked_powi(i64::from(horizon - cf.period))
            .unwrap_or(Decimal::ZERO);
        total = cf
            .amount
            .checked_mul(factor)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| FinCalcError::NumericOverflow {
                context: format!("horizon value at rate {rate}"),
            })?;
    }
    Ok(total)
}

/// NPV built from discount factors `(1 + rate)^-t`, which only shrink for a
/// positive rate, so distant periods fade to zero instead of overflowing.
fn discounted_value(rate: Rate, flows: &[CashFlow]) -> FinCalcResult<Money> {
    let discount = Decimal::ONE / (Decimal::ONE + rate);
    let mut total = Decimal::ZERO;
    for cf in flows {
        let factor = discount.checked_powi(i64::from(cf.period)).unwrap_or(Decimal::ZERO);
        total = cf
            .amount
            .checked_mul(factor)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| FinCalcError::NumericOverflow {
                context: format!("discounted value at rate {rate}"),
            })?;
    }
    Ok(total)
}

/// A value with the sign of the NPV at `rate`, plus the NPV itself when it
/// is representable.
fn signed_npv(rate: Rate, flows: &[CashFlow], horizon: u32) -> FinCalcResult<(Money, Option<Money>)> {
    if rate > Decimal::ZERO {
        let value = discounted_value(rate, flows)?;
        return Ok((value, Some(value)));
    }
    let value = horizon_value(rate, flows, horizon)?;
    let npv = compound_factor(rate, horizon)
        .ok()
        .filter(|f| !f.is_zero())
        .and_then(|f| value.checked_div(f));
    Ok((value, npv))
}

/// Search settings for [`irr_bisection`]
#[derive(Debug, Clone, Copy)]
pub struct BisectionConfig {
    pub low: Rate,
    pub high: Rate,
    pub max_iterations: u32,
    pub npv_tolerance: Money,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        BisectionConfig {
            low: IRR_BRACKET_LOW,
            high: IRR_BRACKET_HIGH,
            max_iterations: MAX_BISECTION_ITERATIONS,
            npv_tolerance: NPV_TOLERANCE,
        }
    }
}

/// Internal Rate of Return by bisection.
///
/// The bracket must contain a sign change of the NPV; otherwise the search is
/// refused with [`FinCalcError::NonConvergent`] instead of returning an
/// arbitrary midpoint. The midpoint after `max_iterations` halvings is
/// returned unless |NPV| drops below `npv_tolerance` first.
pub fn irr_bisection(flows: &[CashFlow], config: &BisectionConfig) -> FinCalcResult<Rate> {
    if flows.len() < 2 {
        return Err(FinCalcError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if config.low <= dec!(-1) || config.high <= config.low {
        return Err(FinCalcError::invalid(
            "bracket",
            "Bracket must satisfy -100% < low < high",
        ));
    }

    let horizon = flows.iter().map(|cf| cf.period).max().unwrap_or(0);
    let mut low = config.low;
    let mut high = config.high;

    let (at_low, _) = signed_npv(low, flows, horizon)?;
    if at_low.is_zero() {
        return Ok(low);
    }
    let (at_high, _) = signed_npv(high, flows, horizon)?;
    if at_high.is_zero() {
        return Ok(high);
    }
    if at_low.is_sign_negative() == at_high.is_sign_negative() {
        return Err(FinCalcError::NonConvergent {
            function: "IRR bisection".into(),
            iterations: 0,
            reason: format!("NPV has the same sign at {low} and {high}; no root is bracketed"),
        });
    }
    let low_is_negative = at_low.is_sign_negative();

    let mut mid = (low + high) / dec!(2);
    for i in 0..config.max_iterations {
        mid = (low + high) / dec!(2);
        let (value, npv_mid) = signed_npv(mid, flows, horizon)?;
        if let Some(npv_mid) = npv_mid {
            if npv_mid.abs() < config.npv_tolerance {
                debug!(iteration = i, rate = %mid, npv = %npv_mid, "IRR bisection within tolerance");
                return Ok(mid);
            }
        }
        if value.is_zero() {
            return Ok(mid);
        }

        if value.is_sign_negative() == low_is_negative {
            low = mid;
        } else {
            high = mid;
        }
    }

    debug!(iterations = config.max_iterations, rate = %mid, "IRR bisection exhausted iterations");
    Ok(mid)
}

/// Annualised return of a single deposit that grows to `final_value`.
pub fn lump_sum_irr(principal: Money, final_value: Money, years: Years) -> FinCalcResult<Rate> {
    if principal <= Decimal::ZERO {
        return Err(FinCalcError::invalid("principal", "must be positive"));
    }
    if final_value <= Decimal::ZERO {
        return Err(FinCalcError::invalid("final_value", "must be positive"));
    }
    if years <= Decimal::ZERO {
        return Err(FinCalcError::invalid("years", "must be positive"));
    }

    let ratio = final_value / principal;
    let grown = ratio
        .checked_powd(Decimal::ONE / years)
        .ok_or_else(|| FinCalcError::NumericOverflow {
            context: format!("({ratio})^(1/{years})"),
        })?;
    Ok(grown - Decimal::ONE)
}

/// `pay_years` contributions of `payment` at t = 0.., then one payout at `wait_years`.
pub fn scheduled_cash_flows(
    payment: Money,
    pay_years: u32,
    final_payout: Money,
    wait_years: u32,
) -> Vec<CashFlow> {
    let mut flows: Vec<CashFlow> = (0..pay_years)
        .map(|t| CashFlow::new(t, -payment))
        .collect();
    match flows.iter_mut().find(|cf| cf.period == wait_years) {
        Some(cf) => cf.amount += final_payout,
        None => flows.push(CashFlow::new(wait_years, final_payout)),
    }
    flows
}

/// IRR of a savings-policy shape: level contributions followed by one payout.
pub fn scheduled_irr(
    payment: Money,
    pay_years: u32,
    final_payout: Money,
    wait_years: u32,
) -> FinCalcResult<Rate> {
    if payment <= Decimal::ZERO {
        return Err(FinCalcError::invalid("payment", "must be positive"));
    }
    if pay_years == 0 {
        return Err(FinCalcError::invalid("pay_years", "must be at least 1"));
    }
    if final_payout <= Decimal::ZERO {
        return Err(FinCalcError::invalid("final_payout", "must be positive"));
    }

    let flows = scheduled_cash_flows(payment, pay_years, final_payout, wait_years);
    irr_bisection(&flows, &BisectionConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flows(amounts: &[Decimal]) -> Vec<CashFlow> {
        amounts
            .iter()
            .enumerate()
            .map(|(t, a)| CashFlow::new(t as u32, *a))
            .collect()
    }

    #[test]
    fn test_npv_basic() {
        let cfs = flows(&[dec!(-1000), dec!(300), dec!(400), dec!(500)]);
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = flows(&[dec!(-100), dec!(50), dec!(50), dec!(50)]);
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_100() {
        let cfs = flows(&[dec!(-100), dec!(150)]);
        assert!(npv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_irr_bisection_basic() {
        let cfs = flows(&[dec!(-1000), dec!(400), dec!(400), dec!(400)]);
        let config = BisectionConfig {
            npv_tolerance: dec!(0.0001),
            ..BisectionConfig::default()
        };
        let result = irr_bisection(&cfs, &config).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.001), "got {result}");
    }

    #[test]
    fn test_irr_bisection_rejects_unbracketed_root() {
        let cfs = flows(&[dec!(-100), dec!(-50), dec!(-10)]);
        match irr_bisection(&cfs, &BisectionConfig::default()) {
            Err(FinCalcError::NonConvergent { iterations, .. }) => assert_eq!(iterations, 0),
            other => panic!("Expected NonConvergent, got {other:?}"),
        }
    }

    #[test]
    fn test_irr_bisection_needs_two_flows() {
        let cfs = flows(&[dec!(-100)]);
        assert!(matches!(
            irr_bisection(&cfs, &BisectionConfig::default()),
            Err(FinCalcError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_lump_sum_irr() {
        let rate = lump_sum_irr(dec!(1000000), dec!(1200000), dec!(6)).unwrap();
        assert!((rate - dec!(0.0308)).abs() < dec!(0.001), "got {rate}");
    }

    #[test]
    fn test_lump_sum_irr_rejects_zero_years() {
        assert!(lump_sum_irr(dec!(100), dec!(120), dec!(0)).is_err());
    }

    #[test]
    fn test_scheduled_irr_npv_near_zero() {
        let rate = scheduled_irr(dec!(100000), 6, dec!(700000), 10).unwrap();
        assert!(rate > dec!(0.01) && rate < dec!(0.03), "got {rate}");
        let cfs = scheduled_cash_flows(dec!(100000), 6, dec!(700000), 10);
        assert!(npv(rate, &cfs).unwrap().abs() < dec!(1));
    }

    #[test]
    fn test_scheduled_irr_distant_payout_stays_in_range() {
        // (1 + 100%)^97 exceeds Decimal::MAX
        for wait in [97, 100, 150] {
            let rate = scheduled_irr(dec!(100000), 6, dec!(700000), wait).unwrap();
            assert!(rate > Decimal::ZERO && rate < dec!(0.01), "wait {wait}: got {rate}");
        }
    }

    #[test]
    fn test_scheduled_cash_flows_merge_same_period() {
        let cfs = scheduled_cash_flows(dec!(100), 3, dec!(400), 2);
        assert_eq!(cfs.len(), 3);
        assert_eq!(cfs[2].amount, dec!(300));
    }

    #[test]
    fn test_level_payment_zero_rate_is_straight_line() {
        let p = level_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(p, dec!(100));
    }

    #[test]
    fn test_remaining_balance_after_full_term_is_zero() {
        let r = monthly_rate(dec!(2.1));
        let pmt = level_payment(dec!(1000000), r, 120).unwrap();
        let balance = remaining_balance(dec!(1000000), r, pmt, 120).unwrap();
        assert!(balance < dec!(0.01), "got {balance}");
    }

    #[test]
    fn test_round_to_unit_half_away_from_zero() {
        assert_eq!(round_to_unit(dec!(2.5)), dec!(3));
        assert_eq!(round_to_unit(dec!(2.49)), dec!(2));
    }
}
