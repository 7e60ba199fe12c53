use crate::flow::NodeType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outbound events produced by a state transition.
///
/// The state machine never performs I/O itself; it returns these alongside
/// the new state so the caller can hand them to its dispatch collaborator.
/// Dispatch is fire-and-forget: a failed delivery never rolls back the
/// transition that produced the event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineEvent {
    /// A notify-worthy step became the current, immediately available step.
    StepArrived {
        execution_id: Uuid,
        patient_id: String,
        node_id: String,
        node_type: NodeType,
        title: String,
    },
    /// The execution paused on a delay; re-poll at or after `available_at`.
    ScheduleCheck {
        execution_id: Uuid,
        available_at: DateTime<Utc>,
    },
}
