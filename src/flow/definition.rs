use crate::condition::{CompositeCondition, ConditionRule};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The node types a flow can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Start,
    End,
    FormStart,
    FormEnd,
    Delay,
    Question,
    Calculator,
    Conditions,
}

impl NodeType {
    /// Whether arriving at a step of this type should raise a notification
    /// event for the external dispatch collaborator.
    pub fn is_notify_worthy(self) -> bool {
        matches!(self, NodeType::FormStart | NodeType::FormEnd)
    }

    /// Whether completing a step of this type changes branch selection and
    /// therefore requires the step list to be rebuilt.
    pub fn influences_branching(self) -> bool {
        matches!(self, NodeType::Calculator | NodeType::Conditions)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::FormStart => "formStart",
            NodeType::FormEnd => "formEnd",
            NodeType::Delay => "delay",
            NodeType::Question => "question",
            NodeType::Calculator => "calculator",
            NodeType::Conditions => "conditions",
        };
        write!(f, "{}", name)
    }
}

/// Time unit of a delay node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayUnit {
    Minutes,
    Hours,
    Days,
}

impl DelayUnit {
    /// Lenient parse for conversion layers dealing with loosely typed input.
    /// An unknown unit falls back to minutes and flags the anomaly.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minute" | "minutes" | "min" | "m" => DelayUnit::Minutes,
            "hour" | "hours" | "h" => DelayUnit::Hours,
            "day" | "days" | "d" => DelayUnit::Days,
            other => {
                warn!(unit = other, "unknown delay unit; falling back to minutes");
                DelayUnit::Minutes
            }
        }
    }
}

impl fmt::Display for DelayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayUnit::Minutes => write!(f, "minutes"),
            DelayUnit::Hours => write!(f, "hours"),
            DelayUnit::Days => write!(f, "days"),
        }
    }
}

/// The type-tagged configuration payload of a node, one variant per node
/// type. Validated once at graph construction so the engine never probes for
/// maybe-present fields at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeConfig {
    Start,
    End,
    FormStart {
        title: String,
    },
    FormEnd {
        title: String,
    },
    Delay {
        amount: i64,
        unit: DelayUnit,
    },
    Question {
        /// Accumulator key the answer is stored under.
        field: String,
        title: String,
    },
    Calculator {
        /// Accumulator key the formula result is stored under.
        result_field: String,
        /// Arithmetic expression over the declared input fields.
        formula: String,
        /// Numeric input fields the consumer is expected to submit.
        fields: Vec<String>,
    },
    Conditions {
        /// Evaluated in declared order; the first match selects the branch.
        #[serde(default)]
        composites: Vec<CompositeCondition>,
        /// True/false conjunction fallback when no composite matches.
        #[serde(default)]
        simple: Vec<ConditionRule>,
    },
}

impl NodeConfig {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeConfig::Start => NodeType::Start,
            NodeConfig::End => NodeType::End,
            NodeConfig::FormStart { .. } => NodeType::FormStart,
            NodeConfig::FormEnd { .. } => NodeType::FormEnd,
            NodeConfig::Delay { .. } => NodeType::Delay,
            NodeConfig::Question { .. } => NodeType::Question,
            NodeConfig::Calculator { .. } => NodeType::Calculator,
            NodeConfig::Conditions { .. } => NodeType::Conditions,
        }
    }

    /// The human-facing title, where the node type declares one.
    pub fn title(&self) -> Option<&str> {
        match self {
            NodeConfig::FormStart { title }
            | NodeConfig::FormEnd { title }
            | NodeConfig::Question { title, .. } => Some(title),
            _ => None,
        }
    }
}

/// A single node in a flow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(flatten)]
    pub config: NodeConfig,
}

/// Identifies which logical branch of a multi-branch node an edge represents.
///
/// Explicit keys decouple branch selection from edge declaration order;
/// positional selection remains only as a documented fallback for edges
/// without keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BranchKey {
    /// Taken when the composite condition with this id matches.
    Condition(String),
    /// Taken when the simple rule set evaluates true.
    OnTrue,
    /// Taken when the simple rule set evaluates false.
    OnFalse,
}

/// A directed transition between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchKey>,
}

/// The complete, canonical definition of a flow, ready for validation.
/// This is the target structure for any custom data model conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub id: String,
    pub name: String,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}
