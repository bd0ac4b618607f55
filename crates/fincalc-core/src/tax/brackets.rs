use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::types::{Money, Rate};
use crate::FinCalcResult;

// ---------------------------------------------------------------------------
// Brackets
// ---------------------------------------------------------------------------

/// The three terms a bracket is defined by. Used as the wire form so that a
/// serialized `max_tax_at_bound` is never trusted on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BracketTerms {
    upper_bound: Option<Money>,
    marginal_rate: Rate,
    #[serde(default)]
    progressive_correction: Money,
}

/// One row of a progressive schedule using the "rate × income − correction"
/// shortcut. `upper_bound = None` is the open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BracketTerms")]
pub struct TaxBracket {
    upper_bound: Option<Money>,
    marginal_rate: Rate,
    progressive_correction: Money,
    max_tax_at_bound: Option<Money>,
}

impl TaxBracket {
    pub fn new(upper_bound: Option<Money>, marginal_rate: Rate, progressive_correction: Money) -> Self {
        let max_tax_at_bound = upper_bound.map(|b| b * marginal_rate - progressive_correction);
        TaxBracket {
            upper_bound,
            marginal_rate,
            progressive_correction,
            max_tax_at_bound,
        }
    }

    pub fn upper_bound(&self) -> Option<Money> {
        self.upper_bound
    }

    pub fn marginal_rate(&self) -> Rate {
        self.marginal_rate
    }

    pub fn progressive_correction(&self) -> Money {
        self.progressive_correction
    }

    /// Tax owed at exactly `upper_bound`; `None` for the open-ended bracket.
    pub fn max_tax_at_bound(&self) -> Option<Money> {
        self.max_tax_at_bound
    }

    fn contains_income(&self, income: Money) -> bool {
        self.upper_bound.map_or(true, |b| income <= b)
    }

    fn contains_tax(&self, tax: Money) -> bool {
        self.max_tax_at_bound.map_or(true, |m| tax <= m)
    }
}

impl From<BracketTerms> for TaxBracket {
    fn from(t: BracketTerms) -> Self {
        TaxBracket::new(t.upper_bound, t.marginal_rate, t.progressive_correction)
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// A validated, ascending progressive tax schedule.
///
/// Invariants: at least one bracket, strictly ascending bounds, exactly one
/// open-ended bracket in last position, marginal rates in (0, 1], and the
/// tax is continuous at every bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct TaxSchedule {
    brackets: Vec<TaxBracket>,
}

impl TaxSchedule {
    pub fn new(brackets: Vec<TaxBracket>) -> FinCalcResult<Self> {
        let Some((last, bounded)) = brackets.split_last() else {
            return Err(FinCalcError::invalid(
                "brackets",
                "schedule needs at least one bracket",
            ));
        };

        if last.upper_bound.is_some() {
            return Err(FinCalcError::invalid(
                "brackets",
                "last bracket must be open-ended (no upper_bound)",
            ));
        }

        for (i, b) in brackets.iter().enumerate() {
            if b.marginal_rate <= Decimal::ZERO || b.marginal_rate > Decimal::ONE {
                return Err(FinCalcError::invalid(
                    "marginal_rate",
                    format!("bracket {i}: rate {} must be in (0, 1]", b.marginal_rate),
                ));
            }
        }

        let mut previous: Option<Money> = None;
        for (i, b) in bounded.iter().enumerate() {
            let Some(bound) = b.upper_bound else {
                return Err(FinCalcError::invalid(
                    "brackets",
                    format!("bracket {i}: only the last bracket may be open-ended"),
                ));
            };
            if bound <= Decimal::ZERO || previous.is_some_and(|p| bound <= p) {
                return Err(FinCalcError::invalid(
                    "upper_bound",
                    format!("bracket {i}: bounds must be positive and strictly ascending"),
                ));
            }
            previous = Some(bound);
        }

        for (i, pair) in brackets.windows(2).enumerate() {
            let (lower, upper) = (&pair[0], &pair[1]);
            if let (Some(bound), Some(max_tax)) = (lower.upper_bound, lower.max_tax_at_bound) {
                let next_at_bound = bound * upper.marginal_rate - upper.progressive_correction;
                if next_at_bound != max_tax {
                    return Err(FinCalcError::invalid(
                        "progressive_correction",
                        format!(
                            "bracket {}: tax jumps from {max_tax} to {next_at_bound} at {bound}",
                            i + 1
                        ),
                    ));
                }
            }
        }

        Ok(TaxSchedule { brackets })
    }

    /// Taiwan 2025 comprehensive income tax brackets.
    pub fn taiwan_2025() -> Self {
        TaxSchedule {
            brackets: vec![
                TaxBracket::new(Some(dec!(610000)), dec!(0.05), dec!(0)),
                TaxBracket::new(Some(dec!(1330000)), dec!(0.12), dec!(42700)),
                TaxBracket::new(Some(dec!(2660000)), dec!(0.20), dec!(149100)),
                TaxBracket::new(Some(dec!(4980000)), dec!(0.30), dec!(415100)),
                TaxBracket::new(None, dec!(0.40), dec!(913100)),
            ],
        }
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// First bracket whose bound covers `income`; the open-ended bracket catches the rest.
    pub fn bracket_for_income(&self, income: Money) -> &TaxBracket {
        self.brackets
            .iter()
            .find(|b| b.contains_income(income))
            .unwrap_or(&self.brackets[self.brackets.len() - 1])
    }

    /// First bracket whose maximum tax covers `tax`.
    pub fn bracket_for_tax(&self, tax: Money) -> &TaxBracket {
        self.brackets
            .iter()
            .find(|b| b.contains_tax(tax))
            .unwrap_or(&self.brackets[self.brackets.len() - 1])
    }

    /// Progressive tax on `income`, floored to the currency unit.
    pub fn compute_tax(&self, income: Money) -> FinCalcResult<Money> {
        if income < Decimal::ZERO {
            return Err(FinCalcError::invalid("income", "must not be negative"));
        }
        let b = self.bracket_for_income(income);
        Ok((income * b.marginal_rate - b.progressive_correction)
            .max(Decimal::ZERO)
            .floor())
    }

    /// Smallest whole income whose forward tax equals `tax` (to bracket
    /// quantisation). Not unique: every income that floors to the same tax
    /// is an equally valid preimage.
    pub fn compute_income_from_tax(&self, tax: Money) -> FinCalcResult<Money> {
        if tax < Decimal::ZERO {
            return Err(FinCalcError::invalid("tax", "must not be negative"));
        }
        let b = self.bracket_for_tax(tax);
        Ok(((tax + b.progressive_correction) / b.marginal_rate).ceil())
    }
}

impl Default for TaxSchedule {
    fn default() -> Self {
        TaxSchedule::taiwan_2025()
    }
}

impl TryFrom<Vec<TaxBracket>> for TaxSchedule {
    type Error = FinCalcError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        TaxSchedule::new(brackets)
    }
}

impl From<TaxSchedule> for Vec<TaxBracket> {
    fn from(s: TaxSchedule) -> Self {
        s.brackets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_schedule_is_valid() {
        let builtin = TaxSchedule::taiwan_2025();
        let rebuilt = TaxSchedule::new(builtin.brackets().to_vec()).unwrap();
        assert_eq!(rebuilt, builtin);
    }

    #[test]
    fn test_max_tax_is_derived() {
        let s = TaxSchedule::taiwan_2025();
        let maxes: Vec<Option<Money>> = s.brackets().iter().map(|b| b.max_tax_at_bound()).collect();
        assert_eq!(
            maxes,
            vec![
                Some(dec!(30500)),
                Some(dec!(116900)),
                Some(dec!(382900)),
                Some(dec!(1078900)),
                None
            ]
        );
    }

    #[test]
    fn test_compute_tax_reference_income() {
        let s = TaxSchedule::taiwan_2025();
        // 1,500,000 × 20% − 149,100
        assert_eq!(s.compute_tax(dec!(1500000)).unwrap(), dec!(150900));
    }

    #[test]
    fn test_compute_tax_at_bounds_uses_lower_bracket() {
        let s = TaxSchedule::taiwan_2025();
        assert_eq!(s.compute_tax(dec!(610000)).unwrap(), dec!(30500));
        assert_eq!(s.bracket_for_income(dec!(610000)).marginal_rate(), dec!(0.05));
        assert_eq!(s.bracket_for_income(dec!(610001)).marginal_rate(), dec!(0.12));
        assert_eq!(s.compute_tax(dec!(0)).unwrap(), dec!(0));
    }

    #[test]
    fn test_compute_tax_top_bracket() {
        let s = TaxSchedule::taiwan_2025();
        // 10,000,000 × 40% − 913,100
        assert_eq!(s.compute_tax(dec!(10000000)).unwrap(), dec!(3086900));
    }

    #[test]
    fn test_compute_tax_floors_fractions() {
        let s = TaxSchedule::taiwan_2025();
        // 1,000,001 × 12% − 42,700 = 77,300.12
        assert_eq!(s.compute_tax(dec!(1000001)).unwrap(), dec!(77300));
    }

    #[test]
    fn test_negative_income_rejected() {
        let s = TaxSchedule::taiwan_2025();
        match s.compute_tax(dec!(-1)) {
            Err(FinCalcError::InvalidInput { field, .. }) => assert_eq!(field, "income"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_income_from_tax_exact() {
        let s = TaxSchedule::taiwan_2025();
        assert_eq!(s.compute_income_from_tax(dec!(150900)).unwrap(), dec!(1500000));
        assert_eq!(s.compute_income_from_tax(dec!(30500)).unwrap(), dec!(610000));
        assert_eq!(s.compute_income_from_tax(dec!(0)).unwrap(), dec!(0));
    }

    #[test]
    fn test_income_from_tax_round_trips_through_quantisation() {
        let s = TaxSchedule::taiwan_2025();
        // tax(772,509) = floor(92,701.08 − 42,700) = 50,001
        let tax = s.compute_tax(dec!(772509)).unwrap();
        assert_eq!(tax, dec!(50001));
        let income = s.compute_income_from_tax(tax).unwrap();
        assert_eq!(s.compute_tax(income).unwrap(), tax);
    }

    #[test]
    fn test_rejects_bounded_last_bracket() {
        let r = TaxSchedule::new(vec![TaxBracket::new(Some(dec!(100)), dec!(0.1), dec!(0))]);
        assert!(r.is_err());
    }

    #[test]
    fn test_rejects_descending_bounds() {
        let r = TaxSchedule::new(vec![
            TaxBracket::new(Some(dec!(200)), dec!(0.1), dec!(0)),
            TaxBracket::new(Some(dec!(100)), dec!(0.1), dec!(0)),
            TaxBracket::new(None, dec!(0.1), dec!(0)),
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn test_rejects_discontinuous_correction() {
        let r = TaxSchedule::new(vec![
            TaxBracket::new(Some(dec!(1000)), dec!(0.10), dec!(0)),
            TaxBracket::new(None, dec!(0.20), dec!(50)),
        ]);
        match r {
            Err(FinCalcError::InvalidInput { field, .. }) => {
                assert_eq!(field, "progressive_correction")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_rate() {
        let r = TaxSchedule::new(vec![TaxBracket::new(None, dec!(0), dec!(0))]);
        assert!(r.is_err());
    }

    #[test]
    fn test_deserialize_ignores_supplied_max_tax() {
        let json = r#"[
            {"upper_bound": "1000", "marginal_rate": "0.10", "progressive_correction": "0", "max_tax_at_bound": "999999"},
            {"upper_bound": null, "marginal_rate": "0.20", "progressive_correction": "100"}
        ]"#;
        let s: TaxSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(s.brackets()[0].max_tax_at_bound(), Some(dec!(100)));
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"[{"upper_bound": "1000", "marginal_rate": "0.10"}]"#;
        assert!(serde_json::from_str::<TaxSchedule>(json).is_err());
    }
}
