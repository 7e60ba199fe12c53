use super::{CompositeCondition, ConditionRule, Logic, Operator};
use crate::execution::ResponseAccumulator;
use serde_json::Value;
use tracing::warn;

/// Evaluates a flat rule set as a conjunction: every rule must hold.
pub fn evaluate_simple(rules: &[ConditionRule], acc: &ResponseAccumulator) -> bool {
    rules.iter().all(|rule| evaluate_rule(rule, acc))
}

/// Evaluates a composite condition, combining its rules with its logic.
pub fn evaluate_composite(cond: &CompositeCondition, acc: &ResponseAccumulator) -> bool {
    match cond.logic {
        Logic::And => cond.rules.iter().all(|rule| evaluate_rule(rule, acc)),
        Logic::Or => cond.rules.iter().any(|rule| evaluate_rule(rule, acc)),
    }
}

/// Evaluates one rule against the accumulated values. Fail-closed: an unknown
/// field or an uninterpretable operand evaluates `false`, never an error.
pub fn evaluate_rule(rule: &ConditionRule, acc: &ResponseAccumulator) -> bool {
    let Some(found) = acc.lookup(&rule.field) else {
        warn!(
            field = %rule.field,
            operator = %rule.operator,
            "condition references a field with no accumulated value; evaluating false"
        );
        return false;
    };

    match rule.operator {
        Operator::Equal => values_equal(&found, &rule.value),
        Operator::NotEqual => !values_equal(&found, &rule.value),
        Operator::Greater => numeric_cmp(&found, &rule.value, |x, bound| x > bound),
        Operator::Less => numeric_cmp(&found, &rule.value, |x, bound| x < bound),
        Operator::GreaterEqual => numeric_cmp(&found, &rule.value, |x, bound| x >= bound),
        Operator::LessEqual => numeric_cmp(&found, &rule.value, |x, bound| x <= bound),
        Operator::Between => {
            let Some(end) = rule.value_end.as_ref() else {
                warn!(field = %rule.field, "between rule is missing value_end; evaluating false");
                return false;
            };
            match (as_number(&found), as_number(&rule.value), as_number(end)) {
                (Some(x), Some(lo), Some(hi)) => lo <= x && x <= hi,
                _ => false,
            }
        }
        Operator::Contains => match &found {
            Value::Array(items) => items.iter().any(|item| values_equal(item, &rule.value)),
            other => string_form(other).contains(&string_form(&rule.value)),
        },
        Operator::In => match &rule.value {
            Value::Array(items) => items.iter().any(|item| values_equal(&found, item)),
            other => {
                warn!(
                    field = %rule.field,
                    value = %other,
                    "in rule expects a list value; evaluating false"
                );
                false
            }
        },
    }
}

/// Best-effort numeric interpretation: JSON numbers directly, strings parsed.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn numeric_cmp(found: &Value, bound: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_number(found), as_number(bound)) {
        (Some(x), Some(b)) => cmp(x, b),
        _ => false,
    }
}

/// Exact comparison, tolerant of a number arriving as a string on one side.
fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x == y;
    }
    match (a, b) {
        (Value::String(_), _) | (_, Value::String(_)) => string_form(a) == string_form(b),
        _ => false,
    }
}

fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
