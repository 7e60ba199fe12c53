//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and traits of the careflow crate.
//! Import this module to get access to the core functionality without having
//! to import each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use careflow::prelude::*;
//!
//! # fn run_example(definition: careflow::flow::FlowDefinition) -> Result<()> {
//! let graph = FlowGraph::new(definition)?;
//! let mut engine = FlowEngine::new(MemoryStore::new());
//! engine.register_flow(graph);
//!
//! let (execution, events) = engine.create_execution("bmi-check", "patient-42")?;
//! dispatch_events(&TracingSink, &events);
//! println!("created execution {} in status {}", execution.id, execution.status);
//! # Ok(())
//! # }
//! ```

// Engine facade and collaborator boundaries
pub use crate::dispatch::{dispatch_events, EventSink, TracingSink};
pub use crate::engine::FlowEngine;
pub use crate::store::{ExecutionStore, MemoryStore};

// Flow model
pub use crate::flow::{
    BranchKey, DelayUnit, FlowDefinition, FlowEdge, FlowGraph, FlowNode, IntoFlowDefinition,
    NodeConfig, NodeType,
};

// Conditions
pub use crate::condition::{CompositeCondition, ConditionRule, Logic, Operator, RuleSource};

// Execution state and events
pub use crate::execution::{
    CurrentStep, EngineEvent, ExecutionState, ExecutionStatus, FlowStep, ResponseAccumulator,
    StepResponse,
};

// Error types
pub use crate::error::{ExecutionError, GraphError, StoreError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
