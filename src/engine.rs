//! The engine facade: registered flows + a store, exposing the inbound
//! operations by execution id.
//!
//! Every mutating operation is a load → pure transition → version-checked
//! replace. The pure core always receives an explicit `now`; wall-clock time
//! enters only at this layer.

use crate::error::{ExecutionError, StoreError};
use crate::execution::machine::{self, CurrentStep};
use crate::execution::{EngineEvent, ExecutionState, ExecutionStatus, StepResponse};
use crate::flow::FlowGraph;
use crate::store::ExecutionStore;
use ahash::AHashMap;
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

pub struct FlowEngine<S: ExecutionStore> {
    graphs: AHashMap<String, FlowGraph>,
    store: S,
}

impl<S: ExecutionStore> FlowEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            graphs: AHashMap::new(),
            store,
        }
    }

    /// Registers a validated flow graph under its flow id.
    pub fn register_flow(&mut self, graph: FlowGraph) {
        self.graphs.insert(graph.id().to_string(), graph);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn graph(&self, flow_id: &str) -> Result<&FlowGraph, ExecutionError> {
        self.graphs
            .get(flow_id)
            .ok_or_else(|| ExecutionError::UnknownFlow(flow_id.to_string()))
    }

    /// Assigns a flow to a patient, persisting the new execution.
    pub fn create_execution(
        &self,
        flow_id: &str,
        patient_id: &str,
    ) -> Result<(ExecutionState, Vec<EngineEvent>), ExecutionError> {
        let graph = self.graph(flow_id)?;
        let (state, events) = machine::create(graph, patient_id, Utc::now())?;
        self.store.insert(state.clone())?;
        Ok((state, events))
    }

    /// Records a completion for the current step and advances the execution.
    ///
    /// A concurrent completion of the same execution loses the version race
    /// at the store and surfaces as a conflict; reload and retry.
    pub fn complete_step(
        &self,
        execution_id: Uuid,
        node_id: &str,
        response: StepResponse,
    ) -> Result<(ExecutionState, Vec<EngineEvent>), ExecutionError> {
        let current = self.store.load(execution_id)?;
        let graph = self.graph(&current.flow_id)?;
        match machine::complete_step(graph, &current, node_id, response, Utc::now()) {
            Ok((mut next, events)) => {
                self.commit(&mut next, current.version)?;
                Ok((next, events))
            }
            Err(ExecutionError::Graph(graph_error)) => {
                // Fatal configuration error: the execution is failed and the
                // error surfaced. Nothing to retry from the consumer's side.
                error!(
                    %execution_id,
                    error = %graph_error,
                    "fatal configuration error while advancing execution"
                );
                self.mark_failed(current)?;
                Err(ExecutionError::Graph(graph_error))
            }
            Err(other) => Err(other),
        }
    }

    /// Returns the current step if it is available, a not-yet-available
    /// marker while a delay is running, or finished.
    pub fn get_current_step(&self, execution_id: Uuid) -> Result<CurrentStep, ExecutionError> {
        let state = self.store.load(execution_id)?;
        Ok(machine::current_step(&state, Utc::now()))
    }

    /// Moves the cursor back onto an already-completed step.
    pub fn navigate_back(
        &self,
        execution_id: Uuid,
        target_index: usize,
    ) -> Result<ExecutionState, ExecutionError> {
        let current = self.store.load(execution_id)?;
        let mut next = machine::navigate_back(&current, target_index)?;
        self.commit(&mut next, current.version)?;
        Ok(next)
    }

    /// Checks whether a paused execution's delay has expired and advances it
    /// if so. Intended to be called from the collaborator's periodic trigger.
    pub fn poll(
        &self,
        execution_id: Uuid,
    ) -> Result<Option<(ExecutionState, Vec<EngineEvent>)>, ExecutionError> {
        let current = self.store.load(execution_id)?;
        let graph = self.graph(&current.flow_id)?;
        match machine::poll(graph, &current, Utc::now()) {
            Ok(Some((mut next, events))) => {
                self.commit(&mut next, current.version)?;
                Ok(Some((next, events)))
            }
            Ok(None) => Ok(None),
            Err(ExecutionError::Graph(graph_error)) => {
                // Same contract as complete_step: a configuration error hit
                // while resuming is fatal for the execution, not retryable.
                error!(
                    %execution_id,
                    error = %graph_error,
                    "fatal configuration error while resuming delayed execution"
                );
                self.mark_failed(current)?;
                Err(ExecutionError::Graph(graph_error))
            }
            Err(other) => Err(other),
        }
    }

    fn commit(&self, state: &mut ExecutionState, expected_version: u64) -> Result<(), StoreError> {
        state.version = expected_version + 1;
        self.store.replace(state.clone(), expected_version)
    }

    fn mark_failed(&self, mut state: ExecutionState) -> Result<(), StoreError> {
        let expected = state.version;
        state.status = ExecutionStatus::Failed;
        state.version = expected + 1;
        self.store.replace(state, expected)
    }
}
