use super::accumulator::ResponseAccumulator;
use crate::error::StoreError;
use crate::flow::NodeType;
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    /// Created, no step surfaced yet. Transient: advancing happens in the
    /// same transition that creates the execution.
    Pending,
    /// A step is current and immediately available.
    InProgress,
    /// The current step's `available_at` lies in the future.
    PausedDelayed,
    /// Terminal: no further non-completed step exists.
    Completed,
    /// Terminal: a fatal configuration error was hit mid-life.
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::InProgress => "in-progress",
            ExecutionStatus::PausedDelayed => "paused-delayed",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// The opaque response payload recorded when a step is completed.
///
/// Answers are keyed by field name; their interpretation depends on the node
/// type (calculator inputs are parsed as numbers, question answers stay as
/// given).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    #[serde(default)]
    pub answers: AHashMap<String, serde_json::Value>,
}

impl StepResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.answers.insert(field.into(), value);
        self
    }
}

/// A materialized, ordered instance of a node within one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    pub node_id: String,
    pub node_type: NodeType,
    pub title: String,
    pub order: u32,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<StepResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One patient's run through a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub id: Uuid,
    pub flow_id: String,
    pub flow_name: String,
    pub patient_id: String,
    pub status: ExecutionStatus,
    pub steps: Vec<FlowStep>,
    /// Index of the step surfaced to the consumer; `None` is the terminal
    /// sentinel. Normally the first non-completed step, except right after a
    /// `navigate_back` onto a completed step.
    pub current_step_index: Option<usize>,
    pub accumulator: ResponseAccumulator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step_available_at: Option<DateTime<Utc>>,
    /// Monotonic revision used for optimistic concurrency at the store.
    pub version: u64,
}

impl ExecutionState {
    /// Index of the first non-completed step, regardless of any navigate-back
    /// cursor movement.
    pub fn frontier_index(&self) -> Option<usize> {
        self.steps.iter().position(|step| !step.completed)
    }

    /// Serializes the full state into a snapshot for the persistence
    /// boundary. JSON rather than a binary codec: answer payloads are
    /// arbitrary `serde_json::Value`s, which only a self-describing format
    /// can restore.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(|e| StoreError::Snapshot(e.to_string()))
    }

    /// Restores a state from a snapshot produced by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Snapshot(e.to_string()))
    }
}
