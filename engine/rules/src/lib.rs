//! RailFX Rules Engine
//!
//! A JSON-declared condition/action system that injects provider
//! preferences and margin overrides into routing and pricing. Rule sets
//! load atomically (single-writer swap); evaluation is read-only and
//! deterministic against the snapshot captured at the start of a request.

pub mod context;
pub mod engine;
pub mod evaluator;
pub mod model;

pub use context::EvalContext;
pub use engine::{MarginDecision, ProviderDecision, RulesEngine};
pub use model::{
    ConditionOperator, Conditions, Criterion, CriterionOperator, Rule, RuleAction, RuleMetadata,
    RuleType,
};
