//! Flat evaluation context for rule matching.

use railfx_common::{CurrencyPair, Objective, Side, TimeOfDay, Timestamp};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;

/// The flat field map a rule's criteria compare against. Field names are
/// free-form; the builders below stamp the conventional ones
/// (`currency_pair`, `amount`, `customer_segment`, `time_of_day`, ...).
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    values: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conventional context for a transaction: pair, side, amount and the
    /// UTC time of day derived from the request timestamp.
    pub fn for_transaction(
        pair: &CurrencyPair,
        side: Side,
        amount: Decimal,
        timestamp: Timestamp,
    ) -> Self {
        Self::new()
            .with_str("currency_pair", pair.concat())
            .with_str("base_currency", pair.base.code())
            .with_str("quote_currency", pair.quote.code())
            .with_str("direction", side.to_string())
            .with_number("amount", amount)
            .with_str("time_of_day", TimeOfDay::of(timestamp).to_string())
    }

    pub fn with_str(mut self, field: &str, value: impl Into<String>) -> Self {
        self.values.insert(field.to_string(), Value::String(value.into()));
        self
    }

    pub fn with_number(mut self, field: &str, value: Decimal) -> Self {
        let number = value.to_f64().unwrap_or(0.0);
        if let Some(n) = serde_json::Number::from_f64(number) {
            self.values.insert(field.to_string(), Value::Number(n));
        }
        self
    }

    pub fn with_bool(mut self, field: &str, value: bool) -> Self {
        self.values.insert(field.to_string(), Value::Bool(value));
        self
    }

    pub fn with_objective(self, objective: Objective) -> Self {
        self.with_str("routing_objective", objective.to_string())
    }

    /// Fetch a field; `None` means the field is absent from this context.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use railfx_common::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transaction_context_fields() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::inr());
        let ts = Utc.with_ymd_and_hms(2025, 6, 2, 14, 30, 0).unwrap();
        let ctx = EvalContext::for_transaction(&pair, Side::Sell, dec!(100000), ts)
            .with_str("customer_segment", "SMALL_BUSINESS")
            .with_objective(Objective::BestRate);

        assert_eq!(ctx.get("currency_pair").unwrap().as_str(), Some("USDINR"));
        assert_eq!(ctx.get("direction").unwrap().as_str(), Some("SELL"));
        assert_eq!(ctx.get("time_of_day").unwrap().as_str(), Some("14:30"));
        assert_eq!(
            ctx.get("routing_objective").unwrap().as_str(),
            Some("BEST_RATE")
        );
        assert_eq!(ctx.get("amount").unwrap().as_f64(), Some(100000.0));
        assert!(ctx.get("office").is_none());
    }
}
