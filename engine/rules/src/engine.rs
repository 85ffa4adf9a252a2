//! The rules engine: atomic rule-set swaps, evaluation, and the decision
//! folds routing and pricing consume.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use railfx_common::{EngineError, Objective, ProviderId, Result, RuleId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::EvalContext;
use crate::evaluator::evaluate_conditions;
use crate::model::{Rule, RuleAction, RuleType};

/// Folded outcome of the matching PROVIDER_SELECTION rules.
#[derive(Debug, Clone, Default)]
pub struct ProviderDecision {
    /// Rules that matched, highest priority first.
    pub matched: Vec<RuleId>,
    /// Per-provider count of rules preferring it; each listing is worth
    /// one scoring bonus.
    pub preferred: HashMap<ProviderId, u32>,
    /// Providers removed from the candidate set.
    pub excluded: Vec<ProviderId>,
    /// Replacement objective for the rest of the computation.
    pub objective_override: Option<Objective>,
    /// Short-circuit the ranking to this provider if eligible.
    pub force_provider: Option<ProviderId>,
}

impl ProviderDecision {
    pub fn is_excluded(&self, provider: &ProviderId) -> bool {
        self.excluded.contains(provider)
    }

    pub fn preference_count(&self, provider: &ProviderId) -> u32 {
        self.preferred.get(provider).copied().unwrap_or(0)
    }
}

/// Folded outcome of the matching MARGIN_ADJUSTMENT rules.
#[derive(Debug, Clone, Default)]
pub struct MarginDecision {
    pub matched: Vec<RuleId>,
    /// Replaces the segment base margin when set.
    pub base_override: Option<i64>,
    /// Sum of additive adjustments across matching rules.
    pub additional_bps: i64,
    /// Multiplier on the amount-tier adjustment, applied before the clamp.
    pub tier_multiplier: Option<Decimal>,
    /// Overrides of the clamp bounds.
    pub min_override: Option<i64>,
    pub max_override: Option<i64>,
}

/// Owner of the declared rules. Each rule family has its own set; a load
/// replaces a set atomically so readers observe either the old or the new
/// generation, never a mix.
pub struct RulesEngine {
    provider_rules: RwLock<Arc<Vec<Rule>>>,
    margin_rules: RwLock<Arc<Vec<Rule>>>,
    writer: Mutex<()>,
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesEngine {
    pub fn new() -> Self {
        Self {
            provider_rules: RwLock::new(Arc::new(Vec::new())),
            margin_rules: RwLock::new(Arc::new(Vec::new())),
            writer: Mutex::new(()),
        }
    }

    fn set_for(&self, rule_type: RuleType) -> &RwLock<Arc<Vec<Rule>>> {
        match rule_type {
            RuleType::ProviderSelection => &self.provider_rules,
            RuleType::MarginAdjustment => &self.margin_rules,
        }
    }

    /// Replace one family's rule set from a JSON document. The whole
    /// document must parse and validate or the previous set stays live.
    pub fn load_json(&self, rule_type: RuleType, json: &str) -> Result<usize> {
        let rules: Vec<Rule> = serde_json::from_str(json).map_err(|e| {
            EngineError::Persistence(format!("rules document did not parse: {e}"))
        })?;
        for rule in &rules {
            rule.validate().map_err(|message| EngineError::RuleEvaluation {
                rule_id: rule.rule_id.clone(),
                message,
            })?;
            if rule.rule_type != rule_type {
                return Err(EngineError::RuleEvaluation {
                    rule_id: rule.rule_id.clone(),
                    message: format!("document for {rule_type:?} contains a {:?} rule", rule.rule_type),
                });
            }
        }

        let count = rules.len();
        let _writer = self.writer.lock();
        *self.set_for(rule_type).write() = Arc::new(rules);
        info!(?rule_type, count, "Rule set replaced");
        Ok(count)
    }

    /// The current rule set for a family.
    pub fn rules(&self, rule_type: RuleType) -> Arc<Vec<Rule>> {
        self.set_for(rule_type).read().clone()
    }

    /// Add a single rule. Fails on a duplicate id.
    pub fn add_rule(&self, rule: Rule) -> Result<()> {
        rule.validate().map_err(|message| EngineError::RuleEvaluation {
            rule_id: rule.rule_id.clone(),
            message,
        })?;
        let _writer = self.writer.lock();
        let lock = self.set_for(rule.rule_type);
        let current = lock.read().clone();
        if current.iter().any(|r| r.rule_id == rule.rule_id) {
            return Err(EngineError::ReferenceDataConflict(format!(
                "rule {} already exists",
                rule.rule_id
            )));
        }
        let mut next = (*current).clone();
        next.push(rule);
        *lock.write() = Arc::new(next);
        Ok(())
    }

    /// Remove a rule by id from either family.
    pub fn delete_rule(&self, rule_id: &RuleId) -> Result<()> {
        let _writer = self.writer.lock();
        for rule_type in [RuleType::ProviderSelection, RuleType::MarginAdjustment] {
            let lock = self.set_for(rule_type);
            let current = lock.read().clone();
            if current.iter().any(|r| &r.rule_id == rule_id) {
                let next: Vec<Rule> = current
                    .iter()
                    .filter(|r| &r.rule_id != rule_id)
                    .cloned()
                    .collect();
                *lock.write() = Arc::new(next);
                return Ok(());
            }
        }
        Err(EngineError::RuleNotFound(rule_id.clone()))
    }

    /// Flip a rule's enabled flag; returns the new state.
    pub fn toggle_rule(&self, rule_id: &RuleId) -> Result<bool> {
        let _writer = self.writer.lock();
        for rule_type in [RuleType::ProviderSelection, RuleType::MarginAdjustment] {
            let lock = self.set_for(rule_type);
            let current = lock.read().clone();
            if current.iter().any(|r| &r.rule_id == rule_id) {
                let mut enabled_now = false;
                let next: Vec<Rule> = current
                    .iter()
                    .cloned()
                    .map(|mut r| {
                        if &r.rule_id == rule_id {
                            r.enabled = !r.enabled;
                            enabled_now = r.enabled;
                        }
                        r
                    })
                    .collect();
                *lock.write() = Arc::new(next);
                return Ok(enabled_now);
            }
        }
        Err(EngineError::RuleNotFound(rule_id.clone()))
    }

    /// Matching rules for a family, sorted by priority descending with the
    /// rule id as a deterministic tie-break. A rule that fails to evaluate
    /// is logged and skipped; the request always completes.
    pub fn matching(
        &self,
        rule_type: RuleType,
        ctx: &EvalContext,
        now: DateTime<Utc>,
    ) -> Vec<Rule> {
        let rules = self.rules(rule_type);
        let mut matched: Vec<Rule> = rules
            .iter()
            .filter(|r| r.is_applicable(now))
            .filter(|r| match evaluate_conditions(&r.conditions, ctx) {
                Ok(hit) => {
                    if hit {
                        debug!(rule = %r.rule_id, "Rule matched");
                    }
                    hit
                }
                Err(message) => {
                    warn!(rule = %r.rule_id, %message, "Skipping malformed rule");
                    false
                }
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.rule_id.as_str().cmp(b.rule_id.as_str()))
        });
        matched
    }

    /// Fold the matching PROVIDER_SELECTION rules into a decision. Rules
    /// apply in priority-descending order; scalar fields set by a later
    /// rule overwrite earlier ones.
    pub fn provider_decision(&self, ctx: &EvalContext, now: DateTime<Utc>) -> ProviderDecision {
        let mut decision = ProviderDecision::default();
        for rule in self.matching(RuleType::ProviderSelection, ctx, now) {
            if let RuleAction::ProviderSelection {
                preferred_providers,
                excluded_providers,
                routing_objective_override,
                force_provider,
            } = &rule.actions
            {
                for provider in preferred_providers {
                    *decision.preferred.entry(provider.clone()).or_insert(0) += 1;
                }
                for provider in excluded_providers {
                    if !decision.excluded.contains(provider) {
                        decision.excluded.push(provider.clone());
                    }
                }
                if routing_objective_override.is_some() {
                    decision.objective_override = *routing_objective_override;
                }
                if force_provider.is_some() {
                    decision.force_provider = force_provider.clone();
                }
                decision.matched.push(rule.rule_id.clone());
            }
        }
        decision
    }

    /// Fold the matching MARGIN_ADJUSTMENT rules into a decision.
    pub fn margin_decision(&self, ctx: &EvalContext, now: DateTime<Utc>) -> MarginDecision {
        let mut decision = MarginDecision::default();
        for rule in self.matching(RuleType::MarginAdjustment, ctx, now) {
            if let RuleAction::MarginAdjustment {
                base_margin_override,
                additional_margin_bps,
                tier_adjustment_multiplier,
                min_margin_bps,
                max_margin_bps,
            } = &rule.actions
            {
                if base_margin_override.is_some() {
                    decision.base_override = *base_margin_override;
                }
                decision.additional_bps += additional_margin_bps;
                if tier_adjustment_multiplier.is_some() {
                    decision.tier_multiplier = *tier_adjustment_multiplier;
                }
                if min_margin_bps.is_some() {
                    decision.min_override = *min_margin_bps;
                }
                if max_margin_bps.is_some() {
                    decision.max_override = *max_margin_bps;
                }
                decision.matched.push(rule.rule_id.clone());
            }
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConditionOperator, Conditions, Criterion, CriterionOperator, RuleMetadata};
    use serde_json::json;

    fn provider_rule(id: &str, priority: i32, preferred: &str) -> Rule {
        Rule {
            rule_id: RuleId::new(id),
            rule_name: id.to_string(),
            rule_type: RuleType::ProviderSelection,
            priority,
            enabled: true,
            valid_from: Utc::now() - chrono::Duration::hours(1),
            valid_until: None,
            conditions: Conditions {
                operator: ConditionOperator::And,
                criteria: vec![Criterion {
                    field: "customer_segment".to_string(),
                    operator: CriterionOperator::Equals,
                    value: Some(json!("SMALL_BUSINESS")),
                    values: None,
                }],
            },
            actions: RuleAction::ProviderSelection {
                preferred_providers: vec![ProviderId::new(preferred)],
                excluded_providers: vec![],
                routing_objective_override: None,
                force_provider: None,
            },
            metadata: RuleMetadata::default(),
        }
    }

    fn margin_rule(id: &str, priority: i32, additional: i64, max: Option<i64>) -> Rule {
        Rule {
            rule_id: RuleId::new(id),
            rule_name: id.to_string(),
            rule_type: RuleType::MarginAdjustment,
            priority,
            enabled: true,
            valid_from: Utc::now() - chrono::Duration::hours(1),
            valid_until: None,
            conditions: Conditions {
                operator: ConditionOperator::And,
                criteria: vec![Criterion {
                    field: "currency_pair".to_string(),
                    operator: CriterionOperator::Equals,
                    value: Some(json!("USDINR")),
                    values: None,
                }],
            },
            actions: RuleAction::MarginAdjustment {
                base_margin_override: None,
                additional_margin_bps: additional,
                tier_adjustment_multiplier: None,
                min_margin_bps: None,
                max_margin_bps: max,
            },
            metadata: RuleMetadata::default(),
        }
    }

    fn smb_ctx() -> EvalContext {
        EvalContext::new()
            .with_str("customer_segment", "SMALL_BUSINESS")
            .with_str("currency_pair", "USDINR")
    }

    #[test]
    fn test_preference_counting() {
        let engine = RulesEngine::new();
        engine.add_rule(provider_rule("R1", 90, "WISE")).unwrap();
        engine.add_rule(provider_rule("R2", 50, "WISE")).unwrap();
        engine.add_rule(provider_rule("R3", 70, "XTX_DEALER")).unwrap();

        let decision = engine.provider_decision(&smb_ctx(), Utc::now());
        assert_eq!(decision.matched.len(), 3);
        assert_eq!(decision.preference_count(&ProviderId::new("WISE")), 2);
        assert_eq!(decision.preference_count(&ProviderId::new("XTX_DEALER")), 1);
        assert_eq!(decision.preference_count(&ProviderId::new("HDFC_LOCAL")), 0);
    }

    #[test]
    fn test_priority_order_and_overwrite() {
        let engine = RulesEngine::new();
        let mut high = provider_rule("HIGH", 90, "WISE");
        high.actions = RuleAction::ProviderSelection {
            preferred_providers: vec![],
            excluded_providers: vec![],
            routing_objective_override: Some(Objective::BestRate),
            force_provider: None,
        };
        let mut low = provider_rule("LOW", 10, "WISE");
        low.actions = RuleAction::ProviderSelection {
            preferred_providers: vec![],
            excluded_providers: vec![],
            routing_objective_override: Some(Objective::MaxStp),
            force_provider: None,
        };
        engine.add_rule(high).unwrap();
        engine.add_rule(low).unwrap();

        // Matching order is priority desc, so the later (lower priority)
        // rule overwrites the override.
        let decision = engine.provider_decision(&smb_ctx(), Utc::now());
        assert_eq!(decision.matched[0], RuleId::new("HIGH"));
        assert_eq!(decision.objective_override, Some(Objective::MaxStp));
    }

    #[test]
    fn test_margin_fold_accumulates_additional() {
        let engine = RulesEngine::new();
        engine.add_rule(margin_rule("M1", 90, 10, Some(180))).unwrap();
        engine.add_rule(margin_rule("M2", 80, 5, None)).unwrap();

        let decision = engine.margin_decision(&smb_ctx(), Utc::now());
        assert_eq!(decision.additional_bps, 15);
        assert_eq!(decision.max_override, Some(180));
    }

    #[test]
    fn test_load_replaces_atomically() {
        let engine = RulesEngine::new();
        engine.add_rule(provider_rule("OLD", 10, "WISE")).unwrap();

        let json = serde_json::to_string(&vec![provider_rule("NEW", 20, "XTX_DEALER")]).unwrap();
        let count = engine.load_json(RuleType::ProviderSelection, &json).unwrap();
        assert_eq!(count, 1);

        let rules = engine.rules(RuleType::ProviderSelection);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule_id, RuleId::new("NEW"));
    }

    #[test]
    fn test_load_rejects_mixed_document() {
        let engine = RulesEngine::new();
        let json = serde_json::to_string(&vec![margin_rule("M1", 10, 5, None)]).unwrap();
        let err = engine
            .load_json(RuleType::ProviderSelection, &json)
            .unwrap_err();
        assert_eq!(err.error_code(), "RULE_EVALUATION_ERROR");
    }

    #[test]
    fn test_toggle_and_delete() {
        let engine = RulesEngine::new();
        engine.add_rule(provider_rule("R1", 90, "WISE")).unwrap();

        assert!(!engine.toggle_rule(&RuleId::new("R1")).unwrap());
        let decision = engine.provider_decision(&smb_ctx(), Utc::now());
        assert!(decision.matched.is_empty());

        assert!(engine.toggle_rule(&RuleId::new("R1")).unwrap());
        engine.delete_rule(&RuleId::new("R1")).unwrap();
        let err = engine.delete_rule(&RuleId::new("R1")).unwrap_err();
        assert_eq!(err.error_code(), "RULE_NOT_FOUND");
    }

    #[test]
    fn test_disabled_and_expired_rules_skipped() {
        let engine = RulesEngine::new();
        let mut rule = provider_rule("R1", 90, "WISE");
        rule.valid_until = Some(Utc::now() - chrono::Duration::minutes(5));
        engine.add_rule(rule).unwrap();

        let decision = engine.provider_decision(&smb_ctx(), Utc::now());
        assert!(decision.matched.is_empty());
    }
}
