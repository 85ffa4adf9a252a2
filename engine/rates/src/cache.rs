//! Treasury rate caching with TTL and bounded-staleness reads.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use railfx_common::{constants, CurrencyPair, TreasuryRate};
use tracing::debug;

/// Cached rate entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    rate: TreasuryRate,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.cached_at)
    }
}

/// Configuration for the rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Age below which an entry is fresh.
    pub ttl: Duration,
    /// Age up to which an expired entry may still back an indicative
    /// response.
    pub stale_allowance: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(5),
            stale_allowance: constants::stale_rate_allowance(),
        }
    }
}

/// Thread-safe rate cache keyed by pair.
pub struct RateCache {
    cache: DashMap<String, CacheEntry>,
    config: RateCacheConfig,
}

impl RateCache {
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get a fresh rate, if one is cached within TTL.
    pub fn get(&self, pair: &CurrencyPair) -> Option<TreasuryRate> {
        let entry = self.cache.get(&pair.concat())?;
        if entry.age() < self.config.ttl {
            debug!(pair = %pair, "Rate cache hit");
            return Some(entry.rate.clone());
        }
        debug!(pair = %pair, "Rate cache entry beyond TTL");
        None
    }

    /// Get a rate even past its TTL, up to the stale allowance. Used when
    /// the source times out; the caller must tag the response INDICATIVE.
    pub fn get_stale(&self, pair: &CurrencyPair) -> Option<TreasuryRate> {
        let entry = self.cache.get(&pair.concat())?;
        if entry.age() < self.config.stale_allowance {
            debug!(pair = %pair, age_ms = entry.age().num_milliseconds(), "Serving stale rate");
            return Some(entry.rate.clone());
        }
        None
    }

    /// Insert a rate.
    pub fn insert(&self, rate: TreasuryRate) {
        self.cache.insert(
            rate.pair.concat(),
            CacheEntry {
                rate,
                cached_at: Utc::now(),
            },
        );
    }

    /// Drop entries older than the stale allowance.
    pub fn evict_expired(&self) {
        let allowance = self.config.stale_allowance;
        self.cache.retain(|_, entry| entry.age() < allowance);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}
