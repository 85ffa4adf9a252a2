//! Rule schema: conditions, criteria, and tagged action variants.

use chrono::{DateTime, Utc};
use railfx_common::{Objective, ProviderId, RuleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The two rule families the engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    ProviderSelection,
    MarginAdjustment,
}

/// Logical combinator over a rule's criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    And,
    Or,
}

/// Comparison operator of an individual criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionOperator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Gt,
    Ge,
    Lt,
    Le,
    Between,
    Contains,
    StartsWith,
    EndsWith,
    OutsideHours,
}

/// One field comparison. `value` serves the scalar operators; `values`
/// serves IN/NOT_IN, BETWEEN and OUTSIDE_HOURS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub field: String,
    pub operator: CriterionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

/// A rule's condition block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conditions {
    pub operator: ConditionOperator,
    pub criteria: Vec<Criterion>,
}

/// Rule actions, tagged by shape. Unknown tags fail deserialization, so a
/// malformed document is rejected at load rather than surprising a call
/// site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    ProviderSelection {
        #[serde(default)]
        preferred_providers: Vec<ProviderId>,
        #[serde(default)]
        excluded_providers: Vec<ProviderId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        routing_objective_override: Option<Objective>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        force_provider: Option<ProviderId>,
    },
    MarginAdjustment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_margin_override: Option<i64>,
        #[serde(default)]
        additional_margin_bps: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tier_adjustment_multiplier: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_margin_bps: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_margin_bps: Option<i64>,
    },
}

impl RuleAction {
    /// The rule family this action shape belongs to.
    pub fn rule_type(&self) -> RuleType {
        match self {
            RuleAction::ProviderSelection { .. } => RuleType::ProviderSelection,
            RuleAction::MarginAdjustment { .. } => RuleType::MarginAdjustment,
        }
    }
}

/// Descriptive metadata carried on a rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A declared rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub rule_type: RuleType,
    pub priority: i32,
    pub enabled: bool,
    pub valid_from: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub conditions: Conditions,
    pub actions: RuleAction,
    #[serde(default)]
    pub metadata: RuleMetadata,
}

impl Rule {
    /// Enabled and inside the validity window at `now`.
    pub fn is_applicable(&self, now: DateTime<Utc>) -> bool {
        self.enabled
            && self.valid_from <= now
            && self.valid_until.map(|until| now <= until).unwrap_or(true)
    }

    /// Action shape must match the declared rule type.
    pub fn validate(&self) -> Result<(), String> {
        if self.actions.rule_type() != self.rule_type {
            return Err(format!(
                "rule {} declares {:?} but carries a {:?} action",
                self.rule_id,
                self.rule_type,
                self.actions.rule_type()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn provider_rule_json() -> &'static str {
        r#"{
            "rule_id": "R-WISE-SMB",
            "rule_name": "Prefer Wise for small business",
            "rule_type": "PROVIDER_SELECTION",
            "priority": 90,
            "enabled": true,
            "valid_from": "2025-01-01T00:00:00Z",
            "conditions": {
                "operator": "AND",
                "criteria": [
                    {"field": "customer_segment", "operator": "EQUALS", "value": "SMALL_BUSINESS"},
                    {"field": "routing_objective", "operator": "EQUALS", "value": "BEST_RATE"}
                ]
            },
            "actions": {
                "type": "PROVIDER_SELECTION",
                "preferred_providers": ["WISE"]
            },
            "metadata": {"tags": ["smb"], "description": "Fintech preference"}
        }"#
    }

    #[test]
    fn test_rule_deserialises() {
        let rule: Rule = serde_json::from_str(provider_rule_json()).unwrap();
        assert_eq!(rule.rule_type, RuleType::ProviderSelection);
        assert_eq!(rule.priority, 90);
        rule.validate().unwrap();
        match &rule.actions {
            RuleAction::ProviderSelection {
                preferred_providers,
                ..
            } => assert_eq!(preferred_providers[0], ProviderId::new("WISE")),
            _ => panic!("wrong action variant"),
        }
    }

    #[test]
    fn test_unknown_action_tag_rejected() {
        let json = r#"{"type": "SURGE_PRICING", "factor": 2.0}"#;
        let result: Result<RuleAction, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_type_action_mismatch_rejected() {
        let mut rule: Rule = serde_json::from_str(provider_rule_json()).unwrap();
        rule.rule_type = RuleType::MarginAdjustment;
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_validity_window() {
        let mut rule: Rule = serde_json::from_str(provider_rule_json()).unwrap();
        let now = Utc::now();
        assert!(rule.is_applicable(now));

        rule.enabled = false;
        assert!(!rule.is_applicable(now));

        rule.enabled = true;
        rule.valid_until = Some(now - Duration::hours(1));
        assert!(!rule.is_applicable(now));
    }
}
