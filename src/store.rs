//! The persistence boundary.
//!
//! The engine always reads and replaces the full [`ExecutionState`]; there is
//! no partial-update contract. Replacement carries an expected version so
//! concurrent completions of the same execution are serialized: the loser of
//! a race gets a [`StoreError::VersionConflict`] and can simply reload and
//! retry, since the transition functions are deterministic.

use crate::error::StoreError;
use crate::execution::ExecutionState;
use ahash::AHashMap;
use parking_lot::RwLock;
use uuid::Uuid;

/// Read/replace contract the engine requires from its persistence
/// collaborator.
pub trait ExecutionStore {
    fn load(&self, id: Uuid) -> Result<ExecutionState, StoreError>;

    fn insert(&self, state: ExecutionState) -> Result<(), StoreError>;

    /// Replaces the stored state, failing if the stored version does not
    /// match `expected_version`.
    fn replace(&self, state: ExecutionState, expected_version: u64) -> Result<(), StoreError>;
}

/// In-memory reference store, suitable for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    executions: RwLock<AHashMap<Uuid, ExecutionState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.executions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.read().is_empty()
    }
}

impl ExecutionStore for MemoryStore {
    fn load(&self, id: Uuid) -> Result<ExecutionState, StoreError> {
        self.executions
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn insert(&self, state: ExecutionState) -> Result<(), StoreError> {
        let mut executions = self.executions.write();
        if executions.contains_key(&state.id) {
            return Err(StoreError::AlreadyExists(state.id));
        }
        executions.insert(state.id, state);
        Ok(())
    }

    fn replace(&self, state: ExecutionState, expected_version: u64) -> Result<(), StoreError> {
        let mut executions = self.executions.write();
        let stored = executions
            .get(&state.id)
            .ok_or(StoreError::NotFound(state.id))?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                execution_id: state.id,
                expected: expected_version,
                stored: stored.version,
            });
        }
        executions.insert(state.id, state);
        Ok(())
    }
}
