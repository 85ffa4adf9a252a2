//! Error taxonomy for RailFX operations.

use thiserror::Error;

use crate::currency::CurrencyPair;
use crate::identifiers::{DealId, RuleId};

/// Why a candidate provider was excluded from routing, carried on
/// [`EngineError::NoEligibleProvider`] for diagnostics.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProviderExclusion {
    /// The excluded provider.
    pub provider_id: String,
    /// Machine-readable reason code.
    pub reason: String,
}

/// Main error type for RailFX operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or out-of-range input.
    #[error("Invalid request: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// No rate in the snapshot or cache for the pair.
    #[error("No rate available for {0}")]
    RateUnavailable(CurrencyPair),

    /// Every candidate provider was excluded.
    #[error("No eligible provider for {pair} ({} candidates excluded)", exclusions.len())]
    NoEligibleProvider {
        pair: CurrencyPair,
        exclusions: Vec<ProviderExclusion>,
    },

    /// Illegal deal state transition.
    #[error("Deal {deal_id} is {current}; cannot {attempted}")]
    DealStateConflict {
        deal_id: DealId,
        current: String,
        attempted: String,
    },

    /// Utilisation exceeds the deal's remaining balance.
    #[error("Deal {deal_id}: requested {requested} exceeds remaining {remaining}")]
    InsufficientDealBalance {
        deal_id: DealId,
        requested: rust_decimal::Decimal,
        remaining: rust_decimal::Decimal,
    },

    /// Deal not found in the store.
    #[error("Deal not found: {0}")]
    DealNotFound(DealId),

    /// Primary-key clash or delete of an in-use reference entry.
    #[error("Reference data conflict: {0}")]
    ReferenceDataConflict(String),

    /// A malformed rule. The offending rule is skipped and the request
    /// continues; this variant surfaces only in logs and rule management.
    #[error("Rule {rule_id} failed evaluation: {message}")]
    RuleEvaluation { rule_id: RuleId, message: String },

    /// Rule not found in the active set.
    #[error("Rule not found: {0}")]
    RuleNotFound(RuleId),

    /// Durable write failed; the pending state change was rolled back.
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl EngineError {
    /// Whether this maps to a caller error (4xx) rather than a server
    /// fault (5xx).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            EngineError::RuleEvaluation { .. } | EngineError::Persistence(_)
        )
    }

    /// Stable machine-readable code for transport layers.
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::RateUnavailable(_) => "RATE_UNAVAILABLE",
            EngineError::NoEligibleProvider { .. } => "NO_ELIGIBLE_PROVIDER",
            EngineError::DealStateConflict { .. } => "DEAL_STATE_CONFLICT",
            EngineError::InsufficientDealBalance { .. } => "INSUFFICIENT_DEAL_BALANCE",
            EngineError::DealNotFound(_) => "DEAL_NOT_FOUND",
            EngineError::ReferenceDataConflict(_) => "REFERENCE_DATA_CONFLICT",
            EngineError::RuleEvaluation { .. } => "RULE_EVALUATION_ERROR",
            EngineError::RuleNotFound(_) => "RULE_NOT_FOUND",
            EngineError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Shorthand for a validation failure on a named field.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }
}

/// Result type alias for RailFX operations.
pub type Result<T> = std::result::Result<T, EngineError>;
