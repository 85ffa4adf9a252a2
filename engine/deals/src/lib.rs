//! RailFX Treasury Deals
//!
//! Pre-negotiated rate commitments: the deal entity and its lifecycle
//! state machine, a store with per-deal serialisation and write-ahead
//! JSON persistence, and best-rate arbitration between an active deal and
//! the live treasury rate.

pub mod deal;
pub mod store;

pub use deal::{
    AuditEntry, Deal, DealStatus, NewDeal, UtilizationEntry, UtilizeRequest,
};
pub use store::{BestRateResponse, DealsStore, RateOrigin};
