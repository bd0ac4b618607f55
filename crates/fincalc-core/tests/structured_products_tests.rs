use fincalc_core::structured_products::notes::{
    self, BarrierNoteInput, MaturityOutcome, MaturityScenarioInput, ObservationMode,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fcn(mode: ObservationMode) -> BarrierNoteInput {
    BarrierNoteInput {
        notional: dec!(1000000),
        reference_price: dec!(1000),
        ko_pct: dec!(100),
        strike_pct: dec!(100),
        ki_pct: dec!(65),
        coupon_annual_pct: dec!(12),
        term_months: 6,
        observation_mode: mode,
        scenario: None,
    }
}

#[test]
fn test_reference_barriers() {
    let b = notes::barrier_prices(dec!(1000), dec!(100), dec!(100), dec!(65)).unwrap();
    assert_eq!((b.ko, b.strike, b.ki), (dec!(1000), dec!(1000), dec!(650)));
}

#[test]
fn test_six_month_fcn_profile() {
    let out = notes::analyze_barrier_note(&fcn(ObservationMode::Continuous)).unwrap();
    let r = &out.result;
    // 12% p.a. for half a year
    assert_eq!(r.total_coupon, dec!(60000));
    assert_eq!(r.break_even_price, dec!(940));
    assert_eq!(r.shares_if_delivered, dec!(1000));

    let top = r.payoff_scenarios.last().unwrap();
    assert_eq!(top.outcome, MaturityOutcome::KnockedOut);
    assert_eq!(top.pnl, dec!(60000));
}

#[test]
fn test_european_ki_ignores_path() {
    let mut input = fcn(ObservationMode::TerminalOnly);
    input.scenario = Some(MaturityScenarioInput {
        final_price: dec!(900),
        touched_ki: false,
    });
    let out = notes::analyze_barrier_note(&input).unwrap();
    let s = out.result.scenario.unwrap();
    assert_eq!(s.outcome, MaturityOutcome::SettledAboveStrike);
    assert_eq!(s.pnl, dec!(60000));
}

#[test]
fn test_no_ki_delivers_below_strike() {
    let mut input = fcn(ObservationMode::Unobserved);
    input.scenario = Some(MaturityScenarioInput {
        final_price: dec!(900),
        touched_ki: false,
    });
    let out = notes::analyze_barrier_note(&input).unwrap();
    let s = out.result.scenario.unwrap();
    assert_eq!(s.outcome, MaturityOutcome::DeliveredUnderlying);
    // 900,000 of stock + 60,000 coupons − 1,000,000
    assert_eq!(s.pnl, dec!(-40000));
}

#[test]
fn test_input_from_json_defaults() {
    let json = r#"{
        "notional": "500000",
        "reference_price": "250",
        "ki_pct": "70",
        "coupon_annual_pct": "10",
        "term_months": 12,
        "observation_mode": "none"
    }"#;
    let input: BarrierNoteInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.ko_pct, dec!(100));
    assert_eq!(input.strike_pct, dec!(100));
    assert_eq!(input.observation_mode, ObservationMode::Unobserved);
    let out = notes::analyze_barrier_note(&input).unwrap();
    assert_eq!(out.result.barriers.ki, dec!(175));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_barriers_scale_with_reference(
        reference in 1u64..1_000_000,
        k in 1u64..1000,
        ko in 80u32..130,
        strike in 60u32..110,
        ki in 40u32..100,
    ) {
        let reference = Decimal::from(reference);
        let k = Decimal::from(k);
        let (ko, strike, ki) = (Decimal::from(ko), Decimal::from(strike), Decimal::from(ki));
        let base = notes::barrier_prices(reference, ko, strike, ki).unwrap();
        let scaled = notes::barrier_prices(reference * k, ko, strike, ki).unwrap();
        prop_assert_eq!(scaled.ko, base.ko * k);
        prop_assert_eq!(scaled.strike, base.strike * k);
        prop_assert_eq!(scaled.ki, base.ki * k);
    }
}
