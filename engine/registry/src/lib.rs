//! RailFX Reference Data Registry
//!
//! Typed reference tables (providers, customer tiers, pricing segments,
//! amount tiers, currency categories, CBDC/stablecoin/ramp/rail
//! registries) behind an atomically swapped snapshot. Readers hold a
//! snapshot for the duration of a request; writers build a fresh snapshot
//! and swap it in under a single writer lock.

pub mod registry;
pub mod snapshot;
pub mod tables;

pub use registry::ReferenceRegistry;
pub use snapshot::Snapshot;
pub use tables::*;
