//! RailFX Common Types
//!
//! Shared types used across the RailFX engine crates: currencies and rail
//! classification, treasury rates, identifiers, the error taxonomy, and
//! protocol timing constants.

pub mod currency;
pub mod error;
pub mod identifiers;
pub mod objective;
pub mod rate;
pub mod time;

pub use currency::*;
pub use error::*;
pub use identifiers::*;
pub use objective::*;
pub use rate::*;
pub use time::*;
