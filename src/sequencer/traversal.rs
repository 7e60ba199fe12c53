use crate::condition::{evaluate_composite, evaluate_simple, CompositeCondition, ConditionRule};
use crate::error::GraphError;
use crate::execution::{FlowStep, ResponseAccumulator};
use crate::flow::{BranchKey, FlowEdge, FlowGraph, FlowNode, NodeConfig};
use ahash::AHashSet;
use tracing::{debug, warn};

/// Budget multiplier over the node count of the graph.
pub const TRAVERSAL_BUDGET_FACTOR: usize = 4;
/// Lower bound of the traversal budget for very small graphs.
pub const MIN_TRAVERSAL_BUDGET: usize = 64;

/// Derives the ordered step list for one execution.
///
/// Worklist traversal from the start node, depth-first in edge declaration
/// order so a path reads top to bottom. A visited set bounds re-entry into
/// reconverging or looping regions; the hard visit budget turns a graph
/// pathological enough to exceed it into a fatal configuration error rather
/// than a silently truncated path.
///
/// `start`/`end` nodes are not materialized. A `conditions` node follows only
/// its selected branch, so steps behind unselected branches (including any
/// `formEnd` directly downstream) are omitted until new data re-routes a
/// later rebuild.
pub fn build_steps(
    graph: &FlowGraph,
    acc: &ResponseAccumulator,
) -> Result<Vec<FlowStep>, GraphError> {
    let budget = (graph.node_count() * TRAVERSAL_BUDGET_FACTOR).max(MIN_TRAVERSAL_BUDGET);
    let mut visited: AHashSet<&str> = AHashSet::new();
    let mut worklist: Vec<&str> = vec![graph.start_id()];
    let mut steps: Vec<FlowStep> = Vec::new();
    let mut visits = 0usize;

    while let Some(node_id) = worklist.pop() {
        visits += 1;
        if visits > budget {
            return Err(GraphError::TraversalBudgetExceeded {
                flow_id: graph.id().to_string(),
                budget,
            });
        }
        if !visited.insert(node_id) {
            continue;
        }

        // Validated at construction; a dangling id here is a defect.
        let Some(node) = graph.node(node_id) else {
            return Err(GraphError::EdgeEndpointNotFound {
                edge_id: "<traversal>".to_string(),
                node_id: node_id.to_string(),
            });
        };

        match &node.config {
            NodeConfig::Start => {
                push_all_targets(graph, node_id, &mut worklist);
            }
            NodeConfig::End => {}
            NodeConfig::Conditions { composites, simple } => {
                steps.push(materialize(node, steps.len()));
                if let Some(edge) = select_branch(graph, node, composites, simple, acc) {
                    worklist.push(&edge.target);
                }
            }
            _ => {
                steps.push(materialize(node, steps.len()));
                push_all_targets(graph, node_id, &mut worklist);
            }
        }
    }

    debug!(
        flow_id = %graph.id(),
        steps = steps.len(),
        visits,
        "derived step sequence"
    );
    Ok(steps)
}

/// Pushes every outgoing target, reversed so the first declared edge is
/// explored first by the stack.
fn push_all_targets<'g>(graph: &'g FlowGraph, node_id: &str, worklist: &mut Vec<&'g str>) {
    let targets: Vec<&str> = graph
        .outgoing_edges(node_id)
        .map(|edge| edge.target.as_str())
        .collect();
    for target in targets.into_iter().rev() {
        worklist.push(target);
    }
}

/// Selects the outgoing edge of a conditions node.
///
/// Before any data exists the first declared edge produces the provisional
/// initial path. With data, composites are tried in declared order and the
/// first match selects the edge carrying its branch key (falling back to the
/// composite's position). If no composite matches, the simple rule set picks
/// the true/false edge. If nothing resolves, the last declared edge is the
/// documented fallback, not an error.
fn select_branch<'g>(
    graph: &'g FlowGraph,
    node: &FlowNode,
    composites: &[CompositeCondition],
    simple: &[ConditionRule],
    acc: &ResponseAccumulator,
) -> Option<&'g FlowEdge> {
    let edges: Vec<&FlowEdge> = graph.outgoing_edges(&node.id).collect();
    if edges.is_empty() {
        warn!(node_id = %node.id, "conditions node has no outgoing edges");
        return None;
    }

    if acc.is_empty() {
        return Some(edges[0]);
    }

    for (position, composite) in composites.iter().enumerate() {
        if !evaluate_composite(composite, acc) {
            continue;
        }
        let keyed = edges.iter().find(|edge| {
            matches!(&edge.branch, Some(BranchKey::Condition(id)) if id == &composite.id)
        });
        if let Some(edge) = keyed {
            return Some(edge);
        }
        if let Some(edge) = edges.get(position) {
            debug!(
                node_id = %node.id,
                condition = %composite.id,
                "matched composite has no keyed edge; using positional fallback"
            );
            return Some(edge);
        }
        break;
    }

    if !simple.is_empty() {
        let verdict = evaluate_simple(simple, acc);
        let key = if verdict {
            BranchKey::OnTrue
        } else {
            BranchKey::OnFalse
        };
        if let Some(edge) = edges.iter().find(|edge| edge.branch.as_ref() == Some(&key)) {
            return Some(edge);
        }
        let position = if verdict { 0 } else { 1 };
        if let Some(edge) = edges.get(position) {
            return Some(edge);
        }
    }

    warn!(
        node_id = %node.id,
        "no condition resolved an edge; falling back to the last declared edge"
    );
    edges.last().copied()
}

fn materialize(node: &FlowNode, order: usize) -> FlowStep {
    let node_type = node.config.node_type();
    FlowStep {
        node_id: node.id.clone(),
        node_type,
        title: node
            .config
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| node_type.to_string()),
        order: order as u32,
        completed: false,
        response: None,
        available_at: None,
        completed_at: None,
    }
}
