//! The canonical flow model.
//!
//! A flow is a directed graph of typed nodes describing a treatment or
//! questionnaire protocol. [`FlowDefinition`] is the raw, serde-friendly
//! shape; [`FlowGraph`] is the validated form the engine operates on. Custom
//! formats plug in through the [`IntoFlowDefinition`] trait.

pub mod conversion;
pub mod definition;
pub mod graph;

pub use conversion::IntoFlowDefinition;
pub use definition::{
    BranchKey, DelayUnit, FlowDefinition, FlowEdge, FlowNode, NodeConfig, NodeType,
};
pub use graph::FlowGraph;
