//! Bounded rate resolution: cache, timeout, inverse and USD cross rates.

use std::sync::Arc;

use chrono::Duration;
use railfx_common::{
    constants, Currency, CurrencyPair, EngineError, RateType, Result, TreasuryPosition,
    TreasuryRate,
};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use crate::cache::{RateCache, RateCacheConfig};
use crate::source::RateSource;

/// Configuration for the rate service.
#[derive(Debug, Clone)]
pub struct RateServiceConfig {
    /// Upper bound on a source fetch.
    pub fetch_timeout: Duration,
    /// Cache behaviour.
    pub cache: RateCacheConfig,
}

impl Default for RateServiceConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: constants::rate_fetch_timeout(),
            cache: RateCacheConfig::default(),
        }
    }
}

/// Resolves treasury rates for any fiat pair: directly quoted, inverted,
/// or crossed through USD. Fetches are bounded; on timeout a stale cache
/// entry backs an INDICATIVE response.
pub struct RateService {
    source: Arc<dyn RateSource>,
    cache: RateCache,
    config: RateServiceConfig,
}

impl RateService {
    pub fn new(source: Arc<dyn RateSource>, config: RateServiceConfig) -> Self {
        Self {
            source,
            cache: RateCache::with_config(config.cache.clone()),
            config,
        }
    }

    pub fn with_defaults(source: Arc<dyn RateSource>) -> Self {
        Self::new(source, RateServiceConfig::default())
    }

    /// Fetch a directly quoted rate, bounded by the fetch timeout.
    #[instrument(skip(self), fields(pair = %pair))]
    pub async fn direct(&self, pair: &CurrencyPair) -> Result<(TreasuryRate, RateType)> {
        if let Some(rate) = self.cache.get(pair) {
            return Ok((rate, RateType::Firm));
        }

        let timeout = self
            .config
            .fetch_timeout
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(2));

        match tokio::time::timeout(timeout, self.source.fetch(pair)).await {
            Ok(Ok(rate)) => {
                if !rate.is_coherent() {
                    warn!(pair = %pair, "Source returned incoherent rate; dropping");
                    return self.stale_or_unavailable(pair);
                }
                self.cache.insert(rate.clone());
                Ok((rate, RateType::Firm))
            }
            Ok(Err(EngineError::RateUnavailable(p))) => {
                match self.cache.get_stale(&p) {
                    Some(rate) => Ok((rate, RateType::Indicative)),
                    None => Err(EngineError::RateUnavailable(p)),
                }
            }
            Ok(Err(e)) => {
                warn!(pair = %pair, error = %e, "Rate fetch failed");
                self.stale_or_unavailable(pair)
            }
            Err(_) => {
                warn!(pair = %pair, "Rate fetch timed out");
                self.stale_or_unavailable(pair)
            }
        }
    }

    fn stale_or_unavailable(&self, pair: &CurrencyPair) -> Result<(TreasuryRate, RateType)> {
        self.cache
            .get_stale(pair)
            .map(|rate| (rate, RateType::Indicative))
            .ok_or_else(|| EngineError::RateUnavailable(pair.clone()))
    }

    /// Resolve a rate for any fiat pair: direct quote, inverse of a direct
    /// quote, or a USD cross. Cross rates are derived on demand and never
    /// cached.
    #[instrument(skip(self), fields(pair = %pair))]
    pub async fn resolve(&self, pair: &CurrencyPair) -> Result<(TreasuryRate, RateType)> {
        if pair.base == pair.quote {
            return Ok((unit_rate(pair.clone()), RateType::Firm));
        }

        if self.source.supports_pair(pair) || self.cache.get_stale(pair).is_some() {
            return self.direct(pair).await;
        }

        let inverse = pair.inverse();
        if self.source.supports_pair(&inverse) || self.cache.get_stale(&inverse).is_some() {
            let (rate, rate_type) = self.direct(&inverse).await?;
            return Ok((rate.inverse(), rate_type));
        }

        self.cross_via_usd(pair).await
    }

    /// Shorthand for the resolved mid.
    pub async fn mid(&self, pair: &CurrencyPair) -> Result<Decimal> {
        Ok(self.resolve(pair).await?.0.mid)
    }

    async fn cross_via_usd(&self, pair: &CurrencyPair) -> Result<(TreasuryRate, RateType)> {
        let usd = Currency::usd();
        if pair.base == usd || pair.quote == usd {
            return Err(EngineError::RateUnavailable(pair.clone()));
        }

        // BASE/USD leg.
        let (base_usd, t1) = self
            .leg_mid(&CurrencyPair::new(pair.base.clone(), usd.clone()))
            .await
            .map_err(|_| EngineError::RateUnavailable(pair.clone()))?;
        // USD/QUOTE leg.
        let (usd_quote, t2) = self
            .leg_mid(&CurrencyPair::new(usd, pair.quote.clone()))
            .await
            .map_err(|_| EngineError::RateUnavailable(pair.clone()))?;

        let mid = base_usd.mid * usd_quote.mid;
        // The cross inherits the worst of the two leg spreads.
        let spread_bps = base_usd.spread_bps().max(usd_quote.spread_bps());
        let half = mid * spread_bps / Decimal::from(20_000);

        let mut rate = unit_rate(pair.clone());
        rate.bid = mid - half;
        rate.ask = mid + half;
        rate.mid = mid;
        rate.valid_until = base_usd.valid_until.min(usd_quote.valid_until);

        let rate_type = if t1 == RateType::Indicative || t2 == RateType::Indicative {
            RateType::Indicative
        } else {
            RateType::Firm
        };
        Ok((rate, rate_type))
    }

    /// Resolve one cross leg directly or by inversion.
    async fn leg_mid(&self, pair: &CurrencyPair) -> Result<(TreasuryRate, RateType)> {
        if self.source.supports_pair(pair) || self.cache.get_stale(pair).is_some() {
            return self.direct(pair).await;
        }
        let inverse = pair.inverse();
        let (rate, rate_type) = self.direct(&inverse).await?;
        Ok((rate.inverse(), rate_type))
    }

    /// All pairs the underlying source quotes directly.
    pub fn supported_pairs(&self) -> Vec<CurrencyPair> {
        self.source.supported_pairs()
    }

    /// Evict entries past the stale allowance.
    pub fn evict_expired(&self) {
        self.cache.evict_expired();
    }
}

fn unit_rate(pair: CurrencyPair) -> TreasuryRate {
    TreasuryRate::new(
        pair,
        Decimal::ONE,
        Decimal::ONE,
        TreasuryPosition::Neutral,
        300,
    )
}
