use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The accumulated answers and calculation results of one execution.
///
/// An immutable value threaded through every transition: completions produce
/// a new accumulator via the `with_*` builders instead of mutating shared
/// maps in place. Field lookup resolves calculator results first, then user
/// responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseAccumulator {
    pub user_responses: AHashMap<String, Value>,
    pub calculator_results: AHashMap<String, f64>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while no answer or calculation has been recorded. The sequencer
    /// uses this to build the provisional initial path.
    pub fn is_empty(&self) -> bool {
        self.user_responses.is_empty() && self.calculator_results.is_empty()
    }

    /// Resolves a field, calculator results first, then user responses.
    pub fn lookup(&self, field: &str) -> Option<Value> {
        if let Some(number) = self.calculator_results.get(field) {
            return serde_json::Number::from_f64(*number).map(Value::Number);
        }
        self.user_responses.get(field).cloned()
    }

    pub fn with_user_response(mut self, field: impl Into<String>, value: Value) -> Self {
        self.user_responses.insert(field.into(), value);
        self
    }

    pub fn with_calculator_result(mut self, field: impl Into<String>, value: f64) -> Self {
        self.calculator_results.insert(field.into(), value);
        self
    }
}
