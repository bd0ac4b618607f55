use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FinCalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FinCalcResult;

/// Statutory brokerage commission before any discount
pub const BROKERAGE_FEE_RATE: Rate = dec!(0.001425);
/// Commission charged per order at minimum
pub const MIN_BROKERAGE_FEE: Money = dec!(20);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityType {
    #[default]
    Stock,
    DayTrade,
    Etf,
    Bond,
}

impl SecurityType {
    /// Securities transaction tax, charged on the sell side only
    pub fn transaction_tax_rate(self) -> Rate {
        match self {
            SecurityType::Stock => dec!(0.003),
            SecurityType::DayTrade => dec!(0.0015),
            SecurityType::Etf => dec!(0.001),
            SecurityType::Bond => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTradeInput {
    pub buy_price: Money,
    pub sell_price: Money,
    pub shares: Decimal,
    #[serde(default)]
    pub security_type: SecurityType,
    /// Broker discount as a percentage of the full commission (60 = 40% off)
    #[serde(default = "default_fee_discount_pct")]
    pub fee_discount_pct: Decimal,
}

fn default_fee_discount_pct() -> Decimal {
    dec!(100)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTradeOutput {
    pub buy_value: Money,
    pub sell_value: Money,
    pub buy_fee: Money,
    pub sell_fee: Money,
    pub transaction_tax: Money,
    pub total_costs: Money,
    pub net_profit: Money,
    /// Net profit over buy value plus buy fee
    pub return_on_cost: Rate,
    /// Sell price at which net profit reaches zero
    pub break_even_sell_price: Money,
}

/// Commission on one leg, floored to the dollar and never below the minimum.
pub fn brokerage_fee(trade_value: Money, fee_discount_pct: Decimal) -> Money {
    let discounted = trade_value * BROKERAGE_FEE_RATE * fee_discount_pct / dec!(100);
    discounted.max(MIN_BROKERAGE_FEE).floor()
}

/// Round-trip costs and profit of a buy followed by a sell.
pub fn calculate_trade_costs(input: &StockTradeInput) -> FinCalcResult<ComputationOutput<StockTradeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.buy_price <= Decimal::ZERO {
        return Err(FinCalcError::invalid("buy_price", "must be positive"));
    }
    if input.sell_price < Decimal::ZERO {
        return Err(FinCalcError::invalid("sell_price", "must not be negative"));
    }
    if input.shares <= Decimal::ZERO {
        return Err(FinCalcError::invalid("shares", "must be positive"));
    }
    if input.fee_discount_pct < Decimal::ZERO || input.fee_discount_pct > dec!(100) {
        return Err(FinCalcError::invalid("fee_discount_pct", "must be in [0, 100]"));
    }

    let tax_rate = input.security_type.transaction_tax_rate();
    let buy_value = input.buy_price * input.shares;
    let sell_value = input.sell_price * input.shares;
    let buy_fee = brokerage_fee(buy_value, input.fee_discount_pct);
    let sell_fee = brokerage_fee(sell_value, input.fee_discount_pct);
    let transaction_tax = (sell_value * tax_rate).floor();
    let total_costs = buy_fee + sell_fee + transaction_tax;
    let net_profit = sell_value - sell_fee - transaction_tax - buy_value - buy_fee;

    if buy_fee == MIN_BROKERAGE_FEE || sell_fee == MIN_BROKERAGE_FEE {
        warnings.push(format!("Minimum commission of {MIN_BROKERAGE_FEE} applied"));
    }

    // Ignores the fee floor and rounding
    let sell_cost_rate = BROKERAGE_FEE_RATE * input.fee_discount_pct / dec!(100) + tax_rate;
    let break_even_sell_price = (buy_value + buy_fee) / (Decimal::ONE - sell_cost_rate) / input.shares;

    let output = StockTradeOutput {
        buy_value,
        sell_value,
        buy_fee,
        sell_fee,
        transaction_tax,
        total_costs,
        net_profit,
        return_on_cost: net_profit / (buy_value + buy_fee),
        break_even_sell_price,
    };

    let assumptions = serde_json::json!({
        "fee_rate": BROKERAGE_FEE_RATE.to_string(),
        "min_fee": MIN_BROKERAGE_FEE.to_string(),
        "fee_discount_pct": input.fee_discount_pct.to_string(),
        "transaction_tax_rate": tax_rate.to_string(),
        "security_type": input.security_type,
    });

    Ok(with_metadata(
        "Brokerage on both legs, transaction tax on the sell leg",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(buy: Money, sell: Money, shares: Decimal, kind: SecurityType) -> StockTradeInput {
        StockTradeInput {
            buy_price: buy,
            sell_price: sell,
            shares,
            security_type: kind,
            fee_discount_pct: dec!(60),
        }
    }

    #[test]
    fn test_round_lot_stock_trade() {
        let out = calculate_trade_costs(&trade(dec!(600), dec!(650), dec!(1000), SecurityType::Stock)).unwrap();
        let r = &out.result;
        // 600,000 × 0.001425 × 0.6 = 513
        assert_eq!(r.buy_fee, dec!(513));
        // 650,000 × 0.001425 × 0.6 = 555.75
        assert_eq!(r.sell_fee, dec!(555));
        assert_eq!(r.transaction_tax, dec!(1950));
        assert_eq!(r.net_profit, dec!(46982));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_small_trade_hits_minimum_fee() {
        let out = calculate_trade_costs(&trade(dec!(50), dec!(52), dec!(100), SecurityType::Etf)).unwrap();
        assert_eq!(out.result.buy_fee, dec!(20));
        assert_eq!(out.result.sell_fee, dec!(20));
        assert_eq!(out.result.transaction_tax, dec!(5));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_tax_rates_by_security() {
        assert_eq!(SecurityType::DayTrade.transaction_tax_rate(), dec!(0.0015));
        assert_eq!(SecurityType::Bond.transaction_tax_rate(), Decimal::ZERO);
        let out = calculate_trade_costs(&trade(dec!(100), dec!(100), dec!(1000), SecurityType::Bond)).unwrap();
        assert_eq!(out.result.transaction_tax, Decimal::ZERO);
    }

    #[test]
    fn test_break_even_above_buy_price() {
        let out = calculate_trade_costs(&trade(dec!(600), dec!(600), dec!(1000), SecurityType::Stock)).unwrap();
        assert!(out.result.net_profit < Decimal::ZERO);
        assert!(out.result.break_even_sell_price > dec!(600));
    }

    #[test]
    fn test_security_type_serde() {
        let t: SecurityType = serde_json::from_str("\"day_trade\"").unwrap();
        assert_eq!(t, SecurityType::DayTrade);
    }
}
