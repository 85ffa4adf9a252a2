//! RailFX Rate Source
//!
//! The treasury rate capability: an async [`RateSource`] trait, a TTL
//! cache that also serves stale entries when the source is slow, and a
//! [`RateService`] that bounds fetches, derives inverse and USD cross
//! rates, and tags responses FIRM or INDICATIVE.

pub mod cache;
pub mod service;
pub mod source;

pub use cache::{RateCache, RateCacheConfig};
pub use service::{RateService, RateServiceConfig};
pub use source::{RateSource, StaticRateSource};
