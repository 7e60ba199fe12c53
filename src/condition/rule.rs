use serde::{Deserialize, Serialize};
use std::fmt;

/// Which accumulator a rule's author expects the field to come from.
///
/// This is advisory metadata: evaluation always resolves a field against
/// calculator results first, then user responses, so a rule keeps working
/// when a value migrates between the two maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    Calculation,
    Question,
}

/// Comparison operators available to condition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    /// Inclusive on both ends: `value <= x <= value_end`.
    Between,
    /// Substring or membership check on the string representation.
    Contains,
    /// Membership in a list value.
    In,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
            Operator::Between => "between",
            Operator::Contains => "contains",
            Operator::In => "in",
        };
        write!(f, "{}", symbol)
    }
}

/// A single comparison over one accumulated field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub source: RuleSource,
    pub field: String,
    pub operator: Operator,
    pub value: serde_json::Value,
    /// Upper bound, only meaningful for [`Operator::Between`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_end: Option<serde_json::Value>,
}

/// How the rules of a composite condition are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    And,
    Or,
}

/// A named boolean expression combining several rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeCondition {
    pub id: String,
    pub label: String,
    pub logic: Logic,
    pub rules: Vec<ConditionRule>,
}
