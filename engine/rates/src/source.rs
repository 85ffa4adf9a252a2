//! Rate source trait and the static in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use railfx_common::{
    Currency, CurrencyPair, EngineError, Result, TreasuryPosition, TreasuryRate,
};
use rust_decimal::Decimal;

/// Capability supplying treasury two-way rates for currency pairs.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch the current rate for a pair.
    async fn fetch(&self, pair: &CurrencyPair) -> Result<TreasuryRate>;

    /// Check if this source quotes the given pair directly.
    fn supports_pair(&self, pair: &CurrencyPair) -> bool;

    /// All directly quoted pairs.
    fn supported_pairs(&self) -> Vec<CurrencyPair>;
}

/// In-memory rate source keyed by the concatenated pair key. Seeds the
/// simulator and tests; a production deployment plugs a market-data
/// adapter in behind the same trait.
pub struct StaticRateSource {
    name: String,
    rates: DashMap<String, TreasuryRate>,
}

impl StaticRateSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: DashMap::new(),
        }
    }

    /// A source pre-loaded with the desk's default pair sheet.
    pub fn with_defaults() -> Self {
        let source = Self::new("TREASURY_STATIC");
        for (base, quote, bid, ask, position) in [
            ("USD", "INR", "84.42", "84.58", TreasuryPosition::Long),
            ("EUR", "USD", "1.0545", "1.0569", TreasuryPosition::Neutral),
            ("GBP", "USD", "1.2650", "1.2680", TreasuryPosition::Neutral),
            ("USD", "SGD", "1.3390", "1.3410", TreasuryPosition::Short),
            ("EUR", "INR", "89.10", "89.30", TreasuryPosition::Neutral),
            ("GBP", "INR", "106.40", "106.60", TreasuryPosition::Neutral),
            ("USD", "CNY", "7.2410", "7.2590", TreasuryPosition::Neutral),
            ("USD", "HKD", "7.8090", "7.8310", TreasuryPosition::Neutral),
            ("USD", "THB", "34.41", "34.59", TreasuryPosition::Neutral),
            ("USD", "AED", "3.6695", "3.6735", TreasuryPosition::Neutral),
            ("USD", "JPY", "151.20", "151.60", TreasuryPosition::Long),
        ] {
            let pair = CurrencyPair::new(Currency::new(base), Currency::new(quote));
            source.set_rate(TreasuryRate::new(
                pair,
                bid.parse::<Decimal>().expect("valid decimal"),
                ask.parse::<Decimal>().expect("valid decimal"),
                position,
                300,
            ));
        }
        source
    }

    /// Install or replace a rate.
    pub fn set_rate(&self, rate: TreasuryRate) {
        self.rates.insert(rate.pair.concat(), rate);
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, pair: &CurrencyPair) -> Result<TreasuryRate> {
        self.rates
            .get(&pair.concat())
            .map(|r| r.clone())
            .ok_or_else(|| EngineError::RateUnavailable(pair.clone()))
    }

    fn supports_pair(&self, pair: &CurrencyPair) -> bool {
        self.rates.contains_key(&pair.concat())
    }

    fn supported_pairs(&self) -> Vec<CurrencyPair> {
        self.rates.iter().map(|r| r.pair.clone()).collect()
    }
}
