//! Derives the ordered, patient-specific step sequence from a flow graph.
//!
//! [`build_steps`] is a pure, idempotent function over the graph and the
//! accumulated answers: identical inputs always yield an identical step list.
//! [`merge_steps`] reconciles a freshly derived list with prior history so
//! completed steps are never lost when the remaining path changes shape.

mod merge;
mod traversal;

pub use merge::merge_steps;
pub use traversal::{build_steps, MIN_TRAVERSAL_BUDGET, TRAVERSAL_BUDGET_FACTOR};
