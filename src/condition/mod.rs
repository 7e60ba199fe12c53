//! Boolean condition rules and their evaluator.
//!
//! Conditions gate the branches of a flow. They are evaluated against the
//! [`ResponseAccumulator`](crate::execution::ResponseAccumulator) of an
//! execution and are strictly fail-closed: a rule whose field is unknown, or
//! whose operands cannot be interpreted for the operator, evaluates `false`
//! and is logged, never raised.

mod eval;
mod rule;

pub use eval::{evaluate_composite, evaluate_rule, evaluate_simple};
pub use rule::{CompositeCondition, ConditionRule, Logic, Operator, RuleSource};

pub(crate) use eval::as_number;
