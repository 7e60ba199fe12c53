use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while validating or traversing a flow graph.
///
/// These are configuration errors: they describe a malformed flow, not a bad
/// runtime input. An execution that hits one of these mid-life transitions to
/// the `Failed` status.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("flow '{flow_id}' has no start node")]
    MissingStartNode { flow_id: String },

    #[error("flow '{flow_id}' declares {count} start nodes, exactly one is required")]
    MultipleStartNodes { flow_id: String, count: usize },

    #[error("node id '{node_id}' is declared more than once in flow '{flow_id}'")]
    DuplicateNodeId { flow_id: String, node_id: String },

    #[error("edge '{edge_id}' references unknown node '{node_id}'")]
    EdgeEndpointNotFound { edge_id: String, node_id: String },

    #[error("node '{node_id}' has an invalid configuration: {message}")]
    InvalidNodeConfig { node_id: String, message: String },

    #[error(
        "traversal budget of {budget} node visits exceeded in flow '{flow_id}'; the graph is cyclic or malformed"
    )]
    TraversalBudgetExceeded { flow_id: String, budget: usize },

    #[error("calculator node '{node_id}' has an unparseable formula: {source}")]
    FormulaParse {
        node_id: String,
        #[source]
        source: FormulaError,
    },
}

/// Errors produced by the calculator formula parser and evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("unexpected character '{0}' in formula")]
    UnexpectedChar(char),

    #[error("formula ended unexpectedly")]
    UnexpectedEnd,

    #[error("unexpected token '{0}' in formula")]
    UnexpectedToken(String),

    #[error("field '{0}' is not present in the calculation context")]
    UnknownField(String),
}

/// Errors that can occur when operating on an execution.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The completion targeted a node that is not the current step. The caller
    /// should refresh the current step and retry; no state was mutated.
    #[error(
        "step '{node_id}' is not the current step of execution {execution_id} (current: '{current}')"
    )]
    StaleStep {
        execution_id: Uuid,
        node_id: String,
        current: String,
    },

    #[error("the current step of execution {execution_id} is not available until {available_at}")]
    StepNotYetAvailable {
        execution_id: Uuid,
        available_at: chrono::DateTime<chrono::Utc>,
    },

    #[error("execution {0} is already completed and immutable")]
    AlreadyCompleted(Uuid),

    #[error("cannot navigate back to step index {target}: {reason}")]
    NavigateBack { target: usize, reason: String },

    #[error("no flow is registered under id '{0}'")]
    UnknownFlow(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised at the persistence boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("execution {0} not found")]
    NotFound(Uuid),

    #[error("execution {0} already exists")]
    AlreadyExists(Uuid),

    #[error("version conflict on execution {execution_id}: expected {expected}, stored {stored}")]
    VersionConflict {
        execution_id: Uuid,
        expected: u64,
        stored: u64,
    },

    #[error("execution snapshot could not be (de)serialized: {0}")]
    Snapshot(String),
}

/// Errors that can occur when converting a custom user format into a
/// careflow `FlowDefinition`.
#[derive(Error, Debug, Clone)]
pub enum FlowConversionError {
    #[error("invalid flow data: {0}")]
    ValidationError(String),
}
