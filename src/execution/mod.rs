//! Per-patient execution state and the state machine that advances it.
//!
//! The transition functions in [`machine`] are pure: they take the validated
//! graph, the current state and an explicit `now`, and return a fresh state
//! plus the [`EngineEvent`]s the caller should hand to its dispatch
//! collaborator. All I/O lives outside this module.

pub mod accumulator;
pub mod events;
pub mod machine;
pub mod state;

pub use accumulator::ResponseAccumulator;
pub use events::EngineEvent;
pub use machine::CurrentStep;
pub use state::{ExecutionState, ExecutionStatus, FlowStep, StepResponse};
