//! RailFX Pricing Engine
//!
//! Composes the customer rate from the mid-market rate, the segment base
//! margin, the amount-tier adjustment, the currency-category factor and
//! any negotiated discount, then issues firm quotes with an expiry.

pub mod engine;
pub mod quote;

pub use engine::{PricingEngine, QuoteRequest};
pub use quote::{MarginBreakdown, Quote};
