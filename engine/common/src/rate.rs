//! Treasury rates and basis-point arithmetic.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::{CurrencyPair, Side, TreasuryPosition};

/// Whether a quoted rate is binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateType {
    /// Binding until `valid_until`.
    Firm,
    /// Derived from stale or substituted inputs; not binding.
    Indicative,
}

/// Treasury two-way rate for a currency pair, with margin policy and
/// exposure bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryRate {
    /// The currency pair.
    pub pair: CurrencyPair,
    /// Rate at which the desk buys the base currency.
    pub bid: Decimal,
    /// Rate at which the desk sells the base currency.
    pub ask: Decimal,
    /// Mid-market rate.
    pub mid: Decimal,
    /// Floor margin the desk will accept, in bps.
    pub min_margin_bps: i64,
    /// Target margin for this pair, in bps.
    pub target_margin_bps: i64,
    /// Maximum permitted exposure in base currency.
    pub max_exposure: Decimal,
    /// Current exposure in base currency.
    pub current_exposure: Decimal,
    /// Desk inventory position.
    pub position: TreasuryPosition,
    /// When this rate expires.
    pub valid_until: DateTime<Utc>,
}

impl TreasuryRate {
    /// Create a rate valid for the given number of seconds. The mid is the
    /// arithmetic midpoint of bid and ask.
    pub fn new(
        pair: CurrencyPair,
        bid: Decimal,
        ask: Decimal,
        position: TreasuryPosition,
        valid_for_seconds: i64,
    ) -> Self {
        Self {
            pair,
            bid,
            ask,
            mid: (bid + ask) / Decimal::TWO,
            min_margin_bps: 5,
            target_margin_bps: 15,
            max_exposure: Decimal::ZERO,
            current_exposure: Decimal::ZERO,
            position,
            valid_until: Utc::now() + Duration::seconds(valid_for_seconds),
        }
    }

    /// Check the ordering invariant `bid <= mid <= ask`.
    pub fn is_coherent(&self) -> bool {
        self.bid <= self.mid && self.mid <= self.ask
    }

    /// Check if the rate is still valid.
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.valid_until
    }

    /// Quoted side the customer trades against: the desk sells at `ask`
    /// when the customer sells base, buys at `bid` when the customer buys.
    pub fn customer_base_rate(&self, side: Side) -> Decimal {
        match side {
            Side::Sell => self.ask,
            Side::Buy => self.bid,
        }
    }

    /// Get the spread in basis points.
    pub fn spread_bps(&self) -> Decimal {
        if self.mid.is_zero() {
            return Decimal::ZERO;
        }
        ((self.ask - self.bid) / self.mid) * Decimal::from(10_000)
    }

    /// The inverse rate. Bid and ask swap roles under inversion.
    pub fn inverse(&self) -> TreasuryRate {
        TreasuryRate {
            pair: self.pair.inverse(),
            bid: invert(self.ask),
            ask: invert(self.bid),
            mid: invert(self.mid),
            min_margin_bps: self.min_margin_bps,
            target_margin_bps: self.target_margin_bps,
            max_exposure: self.max_exposure,
            current_exposure: self.current_exposure,
            position: self.position,
            valid_until: self.valid_until,
        }
    }
}

fn invert(value: Decimal) -> Decimal {
    if value.is_zero() {
        Decimal::ZERO
    } else {
        Decimal::ONE / value
    }
}

/// Apply a total adjustment in bps to a base rate, signed so that positive
/// bps always disadvantage the customer for the given side.
pub fn apply_bps(base: Decimal, total_bps: i64, side: Side) -> Decimal {
    let factor = Decimal::from(total_bps) / Decimal::from(10_000);
    match side {
        // Customer receives quote currency; fewer units is worse.
        Side::Sell => base * (Decimal::ONE - factor),
        // Customer pays quote currency; more units is worse.
        Side::Buy => base * (Decimal::ONE + factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Currency;
    use rust_decimal_macros::dec;

    fn usdinr() -> TreasuryRate {
        TreasuryRate::new(
            CurrencyPair::new(Currency::usd(), Currency::inr()),
            dec!(84.42),
            dec!(84.58),
            TreasuryPosition::Long,
            30,
        )
    }

    #[test]
    fn test_mid_and_coherence() {
        let rate = usdinr();
        assert_eq!(rate.mid, dec!(84.50));
        assert!(rate.is_coherent());
    }

    #[test]
    fn test_customer_base_rate_sides() {
        let rate = usdinr();
        assert_eq!(rate.customer_base_rate(Side::Sell), dec!(84.58));
        assert_eq!(rate.customer_base_rate(Side::Buy), dec!(84.42));
    }

    #[test]
    fn test_spread_bps() {
        let rate = usdinr();
        // (84.58 - 84.42) / 84.50 * 10000 ~= 18.93 bps
        let spread = rate.spread_bps();
        assert!(spread > dec!(18.9) && spread < dec!(19.0));
    }

    #[test]
    fn test_inverse_swaps_sides() {
        let rate = usdinr();
        let inv = rate.inverse();
        assert_eq!(inv.pair.concat(), "INRUSD");
        assert!(inv.is_coherent());
        assert!(inv.bid < inv.ask);
    }

    #[test]
    fn test_apply_bps_disadvantages_customer() {
        // 7 bps off 84.58 on a SELL lowers what the customer receives.
        let adjusted = apply_bps(dec!(84.58), 7, Side::Sell);
        assert!(adjusted < dec!(84.58));
        assert!((adjusted - dec!(84.520794)).abs() < dec!(0.000001));

        // The same bps on a BUY raises what the customer pays.
        let adjusted = apply_bps(dec!(84.42), 7, Side::Buy);
        assert!(adjusted > dec!(84.42));
    }
}
