use fincalc_core::lending::annuity::{self, AmortizationParams, LoanInput};
use fincalc_core::Money;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_mortgage_reference_payment() {
    let p = annuity::monthly_payment(dec!(10000000), dec!(2.1), 360).unwrap();
    assert!(
        (p - dec!(37450)).abs() <= dec!(50),
        "Expected ~37,450, got {p}"
    );
}

#[test]
fn test_three_year_grace_on_reference_mortgage() {
    let input = LoanInput {
        principal: dec!(10000000),
        annual_rate_pct: dec!(2.1),
        total_months: 360,
        grace_months: 36,
        include_schedule: true,
    };
    let out = annuity::calculate_loan(&input).unwrap();
    let r = &out.result;
    assert_eq!(r.grace_payment, dec!(17500));
    assert_eq!(r.amortizing_months, 324);
    assert!(r.normal_payment > dec!(37464));

    let schedule = r.schedule.as_ref().unwrap();
    assert_eq!(schedule.iter().filter(|row| row.in_grace).count(), 36);
    assert_eq!(r.unpaid_balance, Decimal::ZERO);
    // grace interest is pure cost
    assert_eq!(r.total_paid - r.total_interest, dec!(10000000));
}

#[test]
fn test_schedule_months_are_sequential() {
    let params = AmortizationParams {
        principal: dec!(2400000),
        annual_rate_pct: dec!(1.8),
        total_months: 120,
        grace_months: 12,
    };
    let rows = annuity::amortization_schedule(&params).unwrap();
    assert!(rows.iter().enumerate().all(|(i, row)| row.month == i as u32 + 1));
    assert!(rows.windows(2).all(|w| w[1].balance <= w[0].balance));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_level_instalments_repay_principal(
        principal in 10_000u64..50_000_000,
        rate_bp in 0u32..300,
        months in 1u32..=360,
    ) {
        let input = LoanInput {
            principal: Decimal::from(principal),
            annual_rate_pct: Decimal::from(rate_bp) / dec!(100),
            total_months: months,
            grace_months: 0,
            include_schedule: true,
        };
        let out = annuity::calculate_loan(&input).unwrap();
        let r = &out.result;
        let n = Decimal::from(months);

        // n level instalments less the interest they carry settle the
        // principal to within a unit of rounding per month
        let contractual: Money = r.normal_payment * n - r.total_interest;
        prop_assert!(
            (contractual - Decimal::from(principal)).abs() <= n,
            "payment {} over {} months repays {}", r.normal_payment, months, contractual
        );

        let last = r.schedule.as_ref().and_then(|rows| rows.last()).map(|row| row.payment);
        prop_assert!(last.is_some_and(|p| (p - r.normal_payment).abs() <= n));
        prop_assert_eq!(r.unpaid_balance, Decimal::ZERO);
    }
}
