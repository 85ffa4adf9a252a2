//! Currency codes, rail classification, and ordered pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement rail class a currency belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RailType {
    /// Traditional fiat correspondent banking.
    Fiat,
    /// Central-bank digital currency network.
    Cbdc,
    /// Fiat-pegged stablecoin on a public chain.
    Stablecoin,
}

impl fmt::Display for RailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RailType::Fiat => write!(f, "FIAT"),
            RailType::Cbdc => write!(f, "CBDC"),
            RailType::Stablecoin => write!(f, "STABLECOIN"),
        }
    }
}

/// A currency code: ISO 4217 for fiat (`USD`), prefixed for CBDCs
/// (`e-INR`), ticker for stablecoins (`USDC`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from a code. Codes are stored uppercase except
    /// the CBDC `e-` prefix, which is preserved.
    pub fn new(code: impl Into<String>) -> Self {
        let raw = code.into();
        if let Some(rest) = raw.strip_prefix("e-").or_else(|| raw.strip_prefix("E-")) {
            Self(format!("e-{}", rest.to_uppercase()))
        } else {
            Self(raw.to_uppercase())
        }
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Whether this code carries the CBDC prefix.
    pub fn has_cbdc_prefix(&self) -> bool {
        self.0.starts_with("e-")
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" => 0,
            "BHD" | "KWD" | "OMR" => 3,
            _ => 2,
        }
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn inr() -> Self {
        Self::new("INR")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An ordered currency pair. Rate tables are keyed by the concatenation of
/// the two codes (`USDINR`); the inverse rate is `1/rate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency (the amount currency).
    pub base: Currency,
    /// Quote currency (the pricing currency).
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Parse a six-letter concatenated fiat pair key such as `USDINR`.
    pub fn parse_concat(key: &str) -> Option<Self> {
        if key.len() != 6 || !key.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self::new(Currency::new(&key[..3]), Currency::new(&key[3..])))
    }

    /// The concatenated rate-table key (`USDINR`).
    pub fn concat(&self) -> String {
        format!("{}{}", self.base.code(), self.quote.code())
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Transaction direction from the customer's perspective: BUY acquires the
/// base currency, SELL disposes of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The opposite side.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Treasury inventory position for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreasuryPosition {
    Long,
    Short,
    Neutral,
}

impl TreasuryPosition {
    /// Bias in basis points applied to the customer rate. Positive values
    /// worsen the rate from the customer's perspective.
    pub fn bias_bps(&self, side: Side) -> i64 {
        match (self, side) {
            (TreasuryPosition::Long, Side::Sell) => -3,
            (TreasuryPosition::Long, Side::Buy) => 3,
            (TreasuryPosition::Short, Side::Sell) => 3,
            (TreasuryPosition::Short, Side::Buy) => -3,
            (TreasuryPosition::Neutral, _) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_normalisation() {
        assert_eq!(Currency::new("usd").code(), "USD");
        assert_eq!(Currency::new("e-inr").code(), "e-INR");
        assert_eq!(Currency::new("E-CNY").code(), "e-CNY");
        assert!(Currency::new("e-INR").has_cbdc_prefix());
        assert!(!Currency::usd().has_cbdc_prefix());
    }

    #[test]
    fn test_pair_concat_and_inverse() {
        let pair = CurrencyPair::new(Currency::usd(), Currency::inr());
        assert_eq!(pair.concat(), "USDINR");
        assert_eq!(pair.inverse().concat(), "INRUSD");
    }

    #[test]
    fn test_pair_parse_concat() {
        let pair = CurrencyPair::parse_concat("USDINR").unwrap();
        assert_eq!(pair.base, Currency::usd());
        assert_eq!(pair.quote, Currency::inr());

        assert!(CurrencyPair::parse_concat("USD").is_none());
        assert!(CurrencyPair::parse_concat("e-INRUS").is_none());
    }

    #[test]
    fn test_position_bias_sign() {
        assert_eq!(TreasuryPosition::Long.bias_bps(Side::Sell), -3);
        assert_eq!(TreasuryPosition::Long.bias_bps(Side::Buy), 3);
        assert_eq!(TreasuryPosition::Short.bias_bps(Side::Sell), 3);
        assert_eq!(TreasuryPosition::Neutral.bias_bps(Side::Buy), 0);
    }
}
