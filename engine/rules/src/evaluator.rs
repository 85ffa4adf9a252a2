//! Criterion and condition evaluation.

use railfx_common::{DailyWindow, TimeOfDay};
use serde_json::Value;

use crate::context::EvalContext;
use crate::model::{ConditionOperator, Conditions, Criterion, CriterionOperator};

/// Evaluate a rule's condition block. Returns `Err` only for a malformed
/// criterion (wrong arity, unparsable window); the engine logs and skips
/// the offending rule.
pub fn evaluate_conditions(
    conditions: &Conditions,
    ctx: &EvalContext,
) -> Result<bool, String> {
    match conditions.operator {
        ConditionOperator::And => {
            for criterion in &conditions.criteria {
                if !evaluate_criterion(criterion, ctx)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ConditionOperator::Or => {
            for criterion in &conditions.criteria {
                if evaluate_criterion(criterion, ctx)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Evaluate one criterion against the context. A missing field evaluates
/// to `false` for every operator except the negative ones, which hold
/// vacuously.
pub fn evaluate_criterion(criterion: &Criterion, ctx: &EvalContext) -> Result<bool, String> {
    let field_value = match ctx.get(&criterion.field) {
        Some(v) => v,
        None => {
            return Ok(matches!(
                criterion.operator,
                CriterionOperator::NotEquals | CriterionOperator::NotIn
            ));
        }
    };

    match criterion.operator {
        CriterionOperator::Equals => Ok(loose_eq(field_value, required_value(criterion)?)),
        CriterionOperator::NotEquals => Ok(!loose_eq(field_value, required_value(criterion)?)),
        CriterionOperator::In => Ok(required_values(criterion)?
            .iter()
            .any(|v| loose_eq(field_value, v))),
        CriterionOperator::NotIn => Ok(!required_values(criterion)?
            .iter()
            .any(|v| loose_eq(field_value, v))),
        CriterionOperator::Gt => compare(field_value, required_value(criterion)?, |a, b| a > b),
        CriterionOperator::Ge => compare(field_value, required_value(criterion)?, |a, b| a >= b),
        CriterionOperator::Lt => compare(field_value, required_value(criterion)?, |a, b| a < b),
        CriterionOperator::Le => compare(field_value, required_value(criterion)?, |a, b| a <= b),
        CriterionOperator::Between => {
            let bounds = required_values(criterion)?;
            if bounds.len() != 2 {
                return Err(format!(
                    "BETWEEN on {:?} requires values [lo, hi]",
                    criterion.field
                ));
            }
            let x = as_number(field_value)
                .ok_or_else(|| format!("field {:?} is not numeric", criterion.field))?;
            let lo = as_number(&bounds[0]).ok_or("BETWEEN lower bound is not numeric")?;
            let hi = as_number(&bounds[1]).ok_or("BETWEEN upper bound is not numeric")?;
            Ok(lo <= x && x <= hi)
        }
        CriterionOperator::Contains => {
            let needle = required_value(criterion)?;
            Ok(match field_value {
                Value::String(s) => needle.as_str().map(|n| s.contains(n)).unwrap_or(false),
                Value::Array(items) => items.iter().any(|v| loose_eq(v, needle)),
                _ => false,
            })
        }
        CriterionOperator::StartsWith => Ok(str_pair(field_value, required_value(criterion)?)
            .map(|(s, p)| s.starts_with(p))
            .unwrap_or(false)),
        CriterionOperator::EndsWith => Ok(str_pair(field_value, required_value(criterion)?)
            .map(|(s, p)| s.ends_with(p))
            .unwrap_or(false)),
        CriterionOperator::OutsideHours => {
            let bounds = required_values(criterion)?;
            if bounds.len() != 2 {
                return Err("OUTSIDE_HOURS requires values [start, end]".to_string());
            }
            let window = DailyWindow::new(
                parse_time(&bounds[0])?,
                parse_time(&bounds[1])?,
            );
            let t: TimeOfDay = field_value
                .as_str()
                .ok_or_else(|| format!("field {:?} is not a time string", criterion.field))?
                .parse()?;
            Ok(!window.contains(t))
        }
    }
}

fn required_value<'a>(criterion: &'a Criterion) -> Result<&'a Value, String> {
    criterion
        .value
        .as_ref()
        .ok_or_else(|| format!("{:?} requires a value", criterion.operator))
}

fn required_values<'a>(criterion: &'a Criterion) -> Result<&'a [Value], String> {
    criterion
        .values
        .as_deref()
        .ok_or_else(|| format!("{:?} requires a values list", criterion.operator))
}

/// Equality that treats all JSON numbers as f64 and compares strings
/// case-sensitively.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(
    field: &Value,
    value: &Value,
    op: impl Fn(f64, f64) -> bool,
) -> Result<bool, String> {
    match (as_number(field), as_number(value)) {
        (Some(a), Some(b)) => Ok(op(a, b)),
        _ => Ok(false),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn str_pair<'a>(a: &'a Value, b: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((a.as_str()?, b.as_str()?))
}

fn parse_time(v: &Value) -> Result<TimeOfDay, String> {
    v.as_str()
        .ok_or_else(|| "time bound must be an hh:mm string".to_string())?
        .parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criterion(field: &str, operator: CriterionOperator, value: Value) -> Criterion {
        Criterion {
            field: field.to_string(),
            operator,
            value: Some(value),
            values: None,
        }
    }

    fn list_criterion(field: &str, operator: CriterionOperator, values: Vec<Value>) -> Criterion {
        Criterion {
            field: field.to_string(),
            operator,
            value: None,
            values: Some(values),
        }
    }

    fn ctx() -> EvalContext {
        EvalContext::new()
            .with_str("customer_segment", "SMALL_BUSINESS")
            .with_str("currency_pair", "USDINR")
            .with_str("time_of_day", "21:15")
            .with_number("amount", rust_decimal_macros::dec!(75000))
    }

    #[test]
    fn test_equals_and_not_equals() {
        let c = criterion("customer_segment", CriterionOperator::Equals, json!("SMALL_BUSINESS"));
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        let c = criterion("customer_segment", CriterionOperator::NotEquals, json!("RETAIL"));
        assert!(evaluate_criterion(&c, &ctx()).unwrap());
    }

    #[test]
    fn test_missing_field_semantics() {
        let c = criterion("office", CriterionOperator::Equals, json!("LONDON"));
        assert!(!evaluate_criterion(&c, &ctx()).unwrap());

        let c = criterion("office", CriterionOperator::NotEquals, json!("LONDON"));
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        let c = list_criterion("office", CriterionOperator::NotIn, vec![json!("LONDON")]);
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        let c = criterion("office", CriterionOperator::StartsWith, json!("LON"));
        assert!(!evaluate_criterion(&c, &ctx()).unwrap());
    }

    #[test]
    fn test_numeric_comparisons() {
        let c = criterion("amount", CriterionOperator::Gt, json!(50000));
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        let c = criterion("amount", CriterionOperator::Le, json!(50000));
        assert!(!evaluate_criterion(&c, &ctx()).unwrap());
    }

    #[test]
    fn test_between_inclusive() {
        let c = list_criterion("amount", CriterionOperator::Between, vec![json!(75000), json!(100000)]);
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        let c = list_criterion("amount", CriterionOperator::Between, vec![json!(80000), json!(100000)]);
        assert!(!evaluate_criterion(&c, &ctx()).unwrap());

        let c = list_criterion("amount", CriterionOperator::Between, vec![json!(80000)]);
        assert!(evaluate_criterion(&c, &ctx()).is_err());
    }

    #[test]
    fn test_in_and_contains() {
        let c = list_criterion(
            "currency_pair",
            CriterionOperator::In,
            vec![json!("USDINR"), json!("EURINR")],
        );
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        let c = criterion("currency_pair", CriterionOperator::Contains, json!("INR"));
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        let c = criterion("currency_pair", CriterionOperator::StartsWith, json!("USD"));
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        let c = criterion("currency_pair", CriterionOperator::EndsWith, json!("USD"));
        assert!(!evaluate_criterion(&c, &ctx()).unwrap());
    }

    #[test]
    fn test_outside_hours_half_open() {
        // 21:15 is outside [08:00, 18:00).
        let c = list_criterion(
            "time_of_day",
            CriterionOperator::OutsideHours,
            vec![json!("08:00"), json!("18:00")],
        );
        assert!(evaluate_criterion(&c, &ctx()).unwrap());

        // 21:15 is inside [20:00, 22:00), so not outside.
        let c = list_criterion(
            "time_of_day",
            CriterionOperator::OutsideHours,
            vec![json!("20:00"), json!("22:00")],
        );
        assert!(!evaluate_criterion(&c, &ctx()).unwrap());
    }

    #[test]
    fn test_and_or_combinators() {
        let both = Conditions {
            operator: ConditionOperator::And,
            criteria: vec![
                criterion("customer_segment", CriterionOperator::Equals, json!("SMALL_BUSINESS")),
                criterion("amount", CriterionOperator::Gt, json!(100000)),
            ],
        };
        assert!(!evaluate_conditions(&both, &ctx()).unwrap());

        let either = Conditions {
            operator: ConditionOperator::Or,
            criteria: both.criteria.clone(),
        };
        assert!(evaluate_conditions(&either, &ctx()).unwrap());
    }
}
