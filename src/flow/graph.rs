use super::definition::{FlowDefinition, FlowEdge, FlowNode, NodeConfig};
use crate::error::GraphError;
use crate::formula::{self, Expr};
use ahash::{AHashMap, AHashSet};
use std::collections::HashSet;
use tracing::warn;

/// A validated flow graph, indexed for traversal.
///
/// Construction enforces the structural invariants the engine relies on:
/// exactly one start node, unique node ids, edge endpoints that exist, and a
/// parseable formula on every calculator node. Soft problems (unreachable
/// nodes, suspicious delay amounts, undeclared formula fields) are logged,
/// not fatal.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    definition: FlowDefinition,
    node_index: AHashMap<String, usize>,
    /// Outgoing edge indices per node, in declaration order.
    outgoing: AHashMap<String, Vec<usize>>,
    formulas: AHashMap<String, Expr>,
    start_id: String,
}

impl FlowGraph {
    pub fn new(definition: FlowDefinition) -> Result<Self, GraphError> {
        let flow_id = definition.id.clone();

        let mut node_index: AHashMap<String, usize> = AHashMap::new();
        for (i, node) in definition.nodes.iter().enumerate() {
            if node_index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNodeId {
                    flow_id,
                    node_id: node.id.clone(),
                });
            }
        }

        let starts: Vec<&FlowNode> = definition
            .nodes
            .iter()
            .filter(|n| matches!(n.config, NodeConfig::Start))
            .collect();
        let start_id = match starts.as_slice() {
            [only] => only.id.clone(),
            [] => return Err(GraphError::MissingStartNode { flow_id }),
            many => {
                return Err(GraphError::MultipleStartNodes {
                    flow_id,
                    count: many.len(),
                });
            }
        };

        let mut outgoing: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (i, edge) in definition.edges.iter().enumerate() {
            for endpoint in [&edge.source, &edge.target] {
                if !node_index.contains_key(endpoint) {
                    return Err(GraphError::EdgeEndpointNotFound {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
            outgoing.entry(edge.source.clone()).or_default().push(i);
        }

        let mut formulas = AHashMap::new();
        for node in &definition.nodes {
            Self::check_config(node, &outgoing)?;
            if let NodeConfig::Calculator {
                formula, fields, ..
            } = &node.config
            {
                let expr = formula::parse(formula).map_err(|source| GraphError::FormulaParse {
                    node_id: node.id.clone(),
                    source,
                })?;
                let mut referenced = HashSet::new();
                expr.referenced_fields(&mut referenced);
                for name in &referenced {
                    if !fields.contains(name) {
                        warn!(
                            node_id = %node.id,
                            field = %name,
                            "formula references a field the calculator does not declare"
                        );
                    }
                }
                formulas.insert(node.id.clone(), expr);
            }
        }

        let graph = Self {
            definition,
            node_index,
            outgoing,
            formulas,
            start_id,
        };
        graph.warn_unreachable();
        Ok(graph)
    }

    fn check_config(
        node: &FlowNode,
        outgoing: &AHashMap<String, Vec<usize>>,
    ) -> Result<(), GraphError> {
        match &node.config {
            NodeConfig::Delay { amount, .. } => {
                if *amount < 1 {
                    // Tolerated here; the delay calculator clamps at runtime.
                    warn!(
                        node_id = %node.id,
                        amount,
                        "delay node declares a non-positive amount; it will be clamped to one minute"
                    );
                }
            }
            NodeConfig::Conditions { composites, simple } => {
                if composites.is_empty() && simple.is_empty() {
                    return Err(GraphError::InvalidNodeConfig {
                        node_id: node.id.clone(),
                        message: "conditions node declares no composite or simple rules".into(),
                    });
                }
                if outgoing.get(&node.id).map_or(true, Vec::is_empty) {
                    return Err(GraphError::InvalidNodeConfig {
                        node_id: node.id.clone(),
                        message: "conditions node has no outgoing edges to select from".into(),
                    });
                }
            }
            NodeConfig::Calculator { result_field, .. } => {
                if result_field.is_empty() {
                    return Err(GraphError::InvalidNodeConfig {
                        node_id: node.id.clone(),
                        message: "calculator node has an empty result_field".into(),
                    });
                }
            }
            NodeConfig::Question { field, .. } => {
                if field.is_empty() {
                    return Err(GraphError::InvalidNodeConfig {
                        node_id: node.id.clone(),
                        message: "question node has an empty field".into(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn warn_unreachable(&self) {
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut stack = vec![self.start_id.as_str()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            for edge in self.outgoing_edges(id) {
                stack.push(&edge.target);
            }
        }
        for node in &self.definition.nodes {
            if !seen.contains(node.id.as_str()) {
                warn!(
                    flow_id = %self.definition.id,
                    node_id = %node.id,
                    "node is unreachable from the start node"
                );
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn start_id(&self) -> &str {
        &self.start_id
    }

    pub fn node_count(&self) -> usize {
        self.definition.nodes.len()
    }

    pub fn node(&self, node_id: &str) -> Option<&FlowNode> {
        self.node_index
            .get(node_id)
            .map(|&i| &self.definition.nodes[i])
    }

    /// Outgoing edges of a node in declaration order.
    pub fn outgoing_edges(&self, node_id: &str) -> impl Iterator<Item = &FlowEdge> {
        self.outgoing
            .get(node_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.definition.edges[i])
    }

    /// The parsed formula of a calculator node, if `node_id` is one.
    pub fn formula(&self, node_id: &str) -> Option<&Expr> {
        self.formulas.get(node_id)
    }

    pub fn definition(&self) -> &FlowDefinition {
        &self.definition
    }
}
