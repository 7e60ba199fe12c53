use super::accumulator::ResponseAccumulator;
use super::events::EngineEvent;
use super::state::{ExecutionState, ExecutionStatus, FlowStep, StepResponse};
use crate::condition::as_number;
use crate::delay;
use crate::error::{ExecutionError, GraphError};
use crate::flow::{FlowGraph, NodeConfig, NodeType};
use crate::sequencer::{build_steps, merge_steps};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What the consumer gets when asking for the current step.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentStep {
    /// The step is available and waiting for the consumer.
    Available(FlowStep),
    /// The current step exists but its availability lies in the future.
    /// Not an error: poll again at or after `available_at`.
    NotYetAvailable { available_at: DateTime<Utc> },
    /// The execution has no further step.
    Finished,
}

/// Creates a new execution from a validated graph.
///
/// Builds the provisional initial path with an empty accumulator and advances
/// onto the first step, so the returned state is already `in-progress` (or
/// `paused-delayed` when the path opens with a delay, or `completed` for a
/// degenerate empty flow).
pub fn create(
    graph: &FlowGraph,
    patient_id: &str,
    now: DateTime<Utc>,
) -> Result<(ExecutionState, Vec<EngineEvent>), GraphError> {
    let steps = build_steps(graph, &ResponseAccumulator::new())?;
    let mut state = ExecutionState {
        id: Uuid::new_v4(),
        flow_id: graph.id().to_string(),
        flow_name: graph.name().to_string(),
        patient_id: patient_id.to_string(),
        status: ExecutionStatus::Pending,
        steps,
        current_step_index: None,
        accumulator: ResponseAccumulator::new(),
        next_step_available_at: None,
        version: 0,
    };

    let mut events = Vec::new();
    advance(graph, &mut state, &mut events, now)?;
    info!(
        execution_id = %state.id,
        flow_id = %state.flow_id,
        patient_id,
        status = %state.status,
        steps = state.steps.len(),
        "execution created"
    );
    Ok((state, events))
}

/// Applies a step completion and advances the execution.
///
/// Rejects completions that do not target the current, available step, with
/// no state mutation. On success the response is recorded on the step, its
/// answer fields are routed into the accumulator, the remaining path is
/// re-derived when the completed node influences branching, and the machine
/// advances onto the next step.
pub fn complete_step(
    graph: &FlowGraph,
    state: &ExecutionState,
    node_id: &str,
    response: StepResponse,
    now: DateTime<Utc>,
) -> Result<(ExecutionState, Vec<EngineEvent>), ExecutionError> {
    if state.status.is_terminal() {
        return Err(ExecutionError::AlreadyCompleted(state.id));
    }
    let Some(frontier) = state.frontier_index() else {
        return Err(ExecutionError::AlreadyCompleted(state.id));
    };

    let current = &state.steps[frontier];
    if current.node_id != node_id {
        return Err(ExecutionError::StaleStep {
            execution_id: state.id,
            node_id: node_id.to_string(),
            current: current.node_id.clone(),
        });
    }
    if let Some(available_at) = current.available_at {
        if now < available_at {
            return Err(ExecutionError::StepNotYetAvailable {
                execution_id: state.id,
                available_at,
            });
        }
    }

    let mut next = state.clone();
    {
        let step = &mut next.steps[frontier];
        step.completed = true;
        step.completed_at = Some(now);
        step.response = Some(response.clone());
    }

    let node_type = next.steps[frontier].node_type;
    if let Some(node) = graph.node(node_id) {
        next.accumulator = route_response(
            graph,
            &node.config,
            node_id,
            &response,
            next.accumulator,
        );
    }

    if node_type.influences_branching() {
        let fresh = build_steps(graph, &next.accumulator)?;
        next.steps = merge_steps(&next.steps, fresh);
    }

    let mut events = Vec::new();
    advance(graph, &mut next, &mut events, now)?;
    debug!(
        execution_id = %next.id,
        node_id,
        status = %next.status,
        "step completed"
    );
    Ok((next, events))
}

/// Returns the step currently surfaced to the consumer.
pub fn current_step(state: &ExecutionState, now: DateTime<Utc>) -> CurrentStep {
    let Some(index) = state.current_step_index else {
        return CurrentStep::Finished;
    };
    let Some(step) = state.steps.get(index) else {
        return CurrentStep::Finished;
    };
    if step.completed {
        // Reached via navigate_back: completed steps are always viewable.
        return CurrentStep::Available(step.clone());
    }
    match step.available_at {
        Some(available_at) if now < available_at => CurrentStep::NotYetAvailable { available_at },
        _ => CurrentStep::Available(step.clone()),
    }
}

/// Moves the consumer's cursor back onto an already-completed step.
///
/// Step data is never mutated; only the cursor moves. The next successful
/// completion snaps the cursor back to the frontier.
pub fn navigate_back(
    state: &ExecutionState,
    target_index: usize,
) -> Result<ExecutionState, ExecutionError> {
    let Some(step) = state.steps.get(target_index) else {
        return Err(ExecutionError::NavigateBack {
            target: target_index,
            reason: format!("index out of range (steps: {})", state.steps.len()),
        });
    };
    if !step.completed {
        return Err(ExecutionError::NavigateBack {
            target: target_index,
            reason: format!("step '{}' is not completed", step.node_id),
        });
    }
    let mut next = state.clone();
    next.current_step_index = Some(target_index);
    Ok(next)
}

/// Poll entry point for delayed continuation.
///
/// If the execution is paused on a delay whose `available_at` has passed, the
/// delay step auto-completes and the machine advances; returns `None` when
/// nothing is due yet (or the execution is not paused at all).
pub fn poll(
    graph: &FlowGraph,
    state: &ExecutionState,
    now: DateTime<Utc>,
) -> Result<Option<(ExecutionState, Vec<EngineEvent>)>, ExecutionError> {
    if state.status != ExecutionStatus::PausedDelayed {
        return Ok(None);
    }
    let Some(frontier) = state.frontier_index() else {
        return Ok(None);
    };
    let step = &state.steps[frontier];
    let due = match step.available_at {
        Some(available_at) => delay::is_expired(available_at, now),
        None => false,
    };
    if !due {
        return Ok(None);
    }

    let mut next = state.clone();
    {
        let step = &mut next.steps[frontier];
        step.completed = true;
        step.completed_at = Some(now);
    }
    let mut events = Vec::new();
    advance(graph, &mut next, &mut events, now)?;
    info!(
        execution_id = %next.id,
        node_id = %state.steps[frontier].node_id,
        status = %next.status,
        "delay expired, execution resumed"
    );
    Ok(Some((next, events)))
}

/// Advances onto the next non-completed step, resolving auto-steps on the
/// way: `conditions` steps complete themselves and trigger a rebuild, `delay`
/// steps pause the execution until their availability passes.
fn advance(
    graph: &FlowGraph,
    state: &mut ExecutionState,
    events: &mut Vec<EngineEvent>,
    now: DateTime<Utc>,
) -> Result<(), GraphError> {
    loop {
        let Some(index) = state.frontier_index() else {
            state.status = ExecutionStatus::Completed;
            state.current_step_index = None;
            state.next_step_available_at = None;
            return Ok(());
        };
        state.current_step_index = Some(index);

        match state.steps[index].node_type {
            NodeType::Conditions => {
                // No consumer input involved; the branch decision is a pure
                // function of the accumulator.
                state.steps[index].completed = true;
                state.steps[index].completed_at = Some(now);
                let fresh = build_steps(graph, &state.accumulator)?;
                state.steps = merge_steps(&state.steps, fresh);
            }
            NodeType::Delay => {
                let available_at = match state.steps[index].available_at {
                    Some(at) => at,
                    None => {
                        let node_id = state.steps[index].node_id.clone();
                        let at = match graph.node(&node_id).map(|n| &n.config) {
                            Some(NodeConfig::Delay { amount, unit }) => {
                                delay::compute_available_at(now, *amount, *unit)
                            }
                            _ => {
                                warn!(
                                    node_id = %node_id,
                                    "delay step has no matching delay node; applying minimal delay"
                                );
                                delay::compute_available_at(now, 0, crate::flow::DelayUnit::Minutes)
                            }
                        };
                        state.steps[index].available_at = Some(at);
                        at
                    }
                };
                if delay::is_expired(available_at, now) {
                    state.steps[index].completed = true;
                    state.steps[index].completed_at = Some(now);
                    continue;
                }
                state.status = ExecutionStatus::PausedDelayed;
                state.next_step_available_at = Some(available_at);
                events.push(EngineEvent::ScheduleCheck {
                    execution_id: state.id,
                    available_at,
                });
                return Ok(());
            }
            node_type => {
                if state.steps[index].available_at.is_none() {
                    state.steps[index].available_at = Some(now);
                }
                state.status = ExecutionStatus::InProgress;
                state.next_step_available_at = None;
                if node_type.is_notify_worthy() {
                    let step = &state.steps[index];
                    events.push(EngineEvent::StepArrived {
                        execution_id: state.id,
                        patient_id: state.patient_id.clone(),
                        node_id: step.node_id.clone(),
                        node_type,
                        title: step.title.clone(),
                    });
                }
                return Ok(());
            }
        }
    }
}

/// Routes the answer fields of a completion into the accumulator according
/// to the node's declared mappings.
fn route_response(
    graph: &FlowGraph,
    config: &NodeConfig,
    node_id: &str,
    response: &StepResponse,
    acc: ResponseAccumulator,
) -> ResponseAccumulator {
    match config {
        NodeConfig::Question { field, .. } => {
            let mut acc = acc;
            for (key, value) in &response.answers {
                acc = acc.with_user_response(key.clone(), value.clone());
            }
            // A single unkeyed answer is aliased under the declared field so
            // conditions can reference it by the node's own name.
            if !response.answers.contains_key(field) {
                if let Ok((_, value)) = response.answers.iter().exactly_one() {
                    acc = acc.with_user_response(field.clone(), value.clone());
                }
            }
            acc
        }
        NodeConfig::Calculator { result_field, .. } => {
            let mut acc = acc;
            for (key, value) in &response.answers {
                match as_number(value) {
                    Some(number) => acc = acc.with_calculator_result(key.clone(), number),
                    None => acc = acc.with_user_response(key.clone(), value.clone()),
                }
            }
            let context: AHashMap<String, f64> = acc.calculator_results.clone();
            if let Some(expr) = graph.formula(node_id) {
                match expr.evaluate(&context) {
                    Ok(result) => {
                        debug!(node_id, field = %result_field, result, "calculator evaluated");
                        acc = acc.with_calculator_result(result_field.clone(), result);
                    }
                    Err(error) => {
                        warn!(
                            node_id,
                            %error,
                            "calculator formula could not be evaluated; result skipped"
                        );
                    }
                }
            }
            acc
        }
        _ => {
            let mut acc = acc;
            for (key, value) in &response.answers {
                acc = acc.with_user_response(key.clone(), value.clone());
            }
            acc
        }
    }
}
