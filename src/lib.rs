//! # careflow - Flow Execution Engine
//!
//! **careflow** walks patients through multi-step treatment and questionnaire
//! protocols ("flows"): directed graphs of typed nodes whose branches are
//! selected by conditions over the answers and calculated values accumulated
//! so far, with configurable time delays between steps.
//!
//! ## Core Workflow
//!
//! The engine operates on a canonical flow model and is format-agnostic:
//!
//! 1.  **Load your data**: Parse your protocol format (a visual-editor
//!     export, a database row, etc.) into your own Rust structs.
//! 2.  **Convert**: Implement [`IntoFlowDefinition`](flow::IntoFlowDefinition)
//!     to translate into careflow's [`FlowDefinition`](flow::FlowDefinition),
//!     then validate it with [`FlowGraph::new`](flow::FlowGraph::new).
//! 3.  **Execute**: Register the graph with a [`FlowEngine`](engine::FlowEngine)
//!     and drive executions through `create_execution`, `complete_step`,
//!     `get_current_step`, `navigate_back` and `poll`.
//! 4.  **Dispatch**: Hand the returned [`EngineEvent`](execution::EngineEvent)s
//!     to your notification and scheduling collaborators via an
//!     [`EventSink`](dispatch::EventSink).
//!
//! The engine itself is synchronous and performs no I/O beyond its
//! persistence trait: transitions are pure functions of graph, state and an
//! explicit timestamp, so identical inputs always produce identical paths.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use careflow::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     // A minimal flow: start -> intake form -> weight question -> end
//!     let definition = FlowDefinition {
//!         id: "intake".into(),
//!         name: "Patient intake".into(),
//!         nodes: vec![
//!             FlowNode { id: "start".into(), config: NodeConfig::Start },
//!             FlowNode {
//!                 id: "welcome".into(),
//!                 config: NodeConfig::FormStart { title: "Welcome".into() },
//!             },
//!             FlowNode {
//!                 id: "q-weight".into(),
//!                 config: NodeConfig::Question { field: "peso".into(), title: "Weight (kg)".into() },
//!             },
//!             FlowNode { id: "end".into(), config: NodeConfig::End },
//!         ],
//!         edges: vec![
//!             FlowEdge { id: "e1".into(), source: "start".into(), target: "welcome".into(), branch: None },
//!             FlowEdge { id: "e2".into(), source: "welcome".into(), target: "q-weight".into(), branch: None },
//!             FlowEdge { id: "e3".into(), source: "q-weight".into(), target: "end".into(), branch: None },
//!         ],
//!     };
//!
//!     let graph = FlowGraph::new(definition)?;
//!     let mut engine = FlowEngine::new(MemoryStore::new());
//!     engine.register_flow(graph);
//!
//!     // Assign the flow to a patient.
//!     let (execution, events) = engine.create_execution("intake", "patient-42")?;
//!     dispatch_events(&TracingSink, &events);
//!
//!     // Walk through the steps.
//!     let (execution, _) = engine.complete_step(execution.id, "welcome", StepResponse::new())?;
//!     let (execution, _) = engine.complete_step(
//!         execution.id,
//!         "q-weight",
//!         StepResponse::new().with_answer("peso", json!(90)),
//!     )?;
//!
//!     assert_eq!(execution.status, ExecutionStatus::Completed);
//!     Ok(())
//! }
//! ```

pub mod condition;
pub mod delay;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod execution;
pub mod flow;
pub mod formula;
pub mod prelude;
pub mod sequencer;
pub mod store;
