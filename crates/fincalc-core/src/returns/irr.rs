use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::time_value::{
    irr_bisection, lump_sum_irr, scheduled_cash_flows, BisectionConfig, IRR_BRACKET_HIGH,
    IRR_BRACKET_LOW, MAX_BISECTION_ITERATIONS,
};
use crate::types::{with_metadata, CashFlow, ComputationOutput, Money, Rate, Years};
use crate::FinCalcResult;

/// The three shapes a return question comes in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IrrInput {
    /// Single premium, single payout
    LumpSum {
        principal: Money,
        final_value: Money,
        years: Years,
    },
    /// Level annual premiums from year 0, one payout at `wait_years`
    Scheduled {
        payment: Money,
        pay_years: u32,
        final_payout: Money,
        wait_years: u32,
    },
    /// Arbitrary annual cash flows
    CashFlows { flows: Vec<CashFlow> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    pub irr: Rate,
    /// `irr` in percent, two decimals
    pub irr_pct: Decimal,
    pub total_paid: Money,
    pub total_received: Money,
    pub net_gain: Money,
    pub money_multiple: Decimal,
}

fn totals(flows: &[CashFlow]) -> (Money, Money) {
    let paid = flows
        .iter()
        .filter(|cf| cf.amount.is_sign_negative())
        .map(|cf| cf.amount.abs())
        .sum::<Decimal>();
    let received = flows
        .iter()
        .filter(|cf| cf.amount.is_sign_positive())
        .map(|cf| cf.amount)
        .sum::<Decimal>();
    (paid, received)
}

/// Annualised internal rate of return for a savings or investment plan.
pub fn calculate_irr(input: &IrrInput) -> FinCalcResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (irr, total_paid, total_received, methodology) = match input {
        IrrInput::LumpSum {
            principal,
            final_value,
            years,
        } => (
            lump_sum_irr(*principal, *final_value, *years)?,
            *principal,
            *final_value,
            "Closed form (final / principal)^(1 / years) − 1",
        ),
        IrrInput::Scheduled {
            payment,
            pay_years,
            final_payout,
            wait_years,
        } => {
            if wait_years.saturating_add(1) < *pay_years {
                warnings.push("Payout arrives before the last premium is paid".into());
            }
            let rate = crate::time_value::scheduled_irr(*payment, *pay_years, *final_payout, *wait_years)?;
            let flows = scheduled_cash_flows(*payment, *pay_years, *final_payout, *wait_years);
            let (paid, received) = totals(&flows);
            (rate, paid, received, "Bisection on NPV over [-99%, 100%]")
        }
        IrrInput::CashFlows { flows } => {
            let rate = irr_bisection(flows, &BisectionConfig::default())?;
            let (paid, received) = totals(flows);
            (rate, paid, received, "Bisection on NPV over [-99%, 100%]")
        }
    };

    if total_paid.is_zero() {
        return Err(FinCalcError::DivisionByZero {
            context: "money multiple with nothing paid in".into(),
        });
    }
    if irr <= IRR_BRACKET_LOW + dec!(0.0001) || irr >= IRR_BRACKET_HIGH - dec!(0.0001) {
        warnings.push(format!("IRR {irr} sits at the edge of the search bracket"));
    }

    let output = IrrOutput {
        irr,
        irr_pct: (irr * dec!(100)).round_dp(2),
        total_paid,
        total_received,
        net_gain: total_received - total_paid,
        money_multiple: total_received / total_paid,
    };

    let assumptions = serde_json::json!({
        "input": input,
        "bracket": [IRR_BRACKET_LOW.to_string(), IRR_BRACKET_HIGH.to_string()],
        "max_iterations": MAX_BISECTION_ITERATIONS,
        "period": "annual",
    });

    Ok(with_metadata(
        methodology,
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lump_sum_mode() {
        let input = IrrInput::LumpSum {
            principal: dec!(1000000),
            final_value: dec!(1200000),
            years: dec!(6),
        };
        let out = calculate_irr(&input).unwrap();
        assert_eq!(out.result.irr_pct, dec!(3.09));
        assert_eq!(out.result.net_gain, dec!(200000));
        assert_eq!(out.result.money_multiple, dec!(1.2));
    }

    #[test]
    fn test_scheduled_mode_totals() {
        let input = IrrInput::Scheduled {
            payment: dec!(100000),
            pay_years: 6,
            final_payout: dec!(700000),
            wait_years: 10,
        };
        let out = calculate_irr(&input).unwrap();
        assert_eq!(out.result.total_paid, dec!(600000));
        assert_eq!(out.result.total_received, dec!(700000));
        assert!(out.result.irr > Decimal::ZERO);
    }

    #[test]
    fn test_cash_flow_mode_from_json() {
        let json = r#"{"mode": "cash_flows", "flows": [
            {"period": 0, "amount": "-1000"},
            {"period": 1, "amount": "400"},
            {"period": 2, "amount": "400"},
            {"period": 3, "amount": "400"}
        ]}"#;
        let input: IrrInput = serde_json::from_str(json).unwrap();
        let out = calculate_irr(&input).unwrap();
        assert!((out.result.irr - dec!(0.097)).abs() < dec!(0.005));
    }

    #[test]
    fn test_losing_policy_has_negative_irr() {
        let input = IrrInput::Scheduled {
            payment: dec!(100000),
            pay_years: 6,
            final_payout: dec!(500000),
            wait_years: 10,
        };
        let out = calculate_irr(&input).unwrap();
        assert!(out.result.irr < Decimal::ZERO);
    }

    #[test]
    fn test_totals_split_paid_and_received() {
        let flows = vec![
            CashFlow::new(0, dec!(-300)),
            CashFlow::new(1, dec!(-200)),
            CashFlow::new(2, dec!(650)),
        ];
        assert_eq!(totals(&flows), (dec!(500), dec!(650)));
    }

    #[test]
    fn test_payout_year_at_u32_max_does_not_overflow() {
        let input = IrrInput::Scheduled {
            payment: dec!(100),
            pay_years: 2,
            final_payout: dec!(300),
            wait_years: u32::MAX,
        };
        let out = calculate_irr(&input).unwrap();
        assert!(out.result.irr.abs() < dec!(0.0001), "got {}", out.result.irr);
        assert_eq!(out.result.total_paid, dec!(200));
    }

    #[test]
    fn test_no_inflow_is_non_convergent() {
        let input = IrrInput::CashFlows {
            flows: vec![CashFlow::new(0, dec!(-100)), CashFlow::new(1, dec!(-100))],
        };
        assert!(matches!(
            calculate_irr(&input),
            Err(FinCalcError::NonConvergent { .. })
        ));
    }
}
