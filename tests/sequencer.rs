//! Tests for step derivation: traversal order, branch selection, merging.
mod common;
use careflow::error::GraphError;
use careflow::prelude::*;
use careflow::sequencer::{build_steps, merge_steps};
use chrono::Duration;
use common::*;
use serde_json::json;

#[test]
fn test_build_steps_skips_start_and_end() {
    let steps = build_steps(&linear_graph(), &ResponseAccumulator::new()).unwrap();
    let ids: Vec<&str> = steps.iter().map(|s| s.node_id.as_str()).collect();
    assert_eq!(ids, vec!["f1", "q1", "f2"]);
    assert!(steps.iter().all(|s| !s.completed));
}

#[test]
fn test_build_steps_assigns_stable_order() {
    let steps = build_steps(&linear_graph(), &ResponseAccumulator::new()).unwrap();
    let orders: Vec<u32> = steps.iter().map(|s| s.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn test_build_steps_is_idempotent() {
    let graph = bmi_graph();
    let acc = accumulator_with_imc(27.78);
    let first = build_steps(&graph, &acc).unwrap();
    let second = build_steps(&graph, &acc).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_provisional_path_follows_first_declared_edge() {
    // Before any data exists, the conditions node must deterministically
    // follow its first outgoing edge.
    let steps = build_steps(&bmi_graph(), &ResponseAccumulator::new()).unwrap();
    let ids: Vec<&str> = steps.iter().map(|s| s.node_id.as_str()).collect();
    assert_eq!(ids, vec!["intake", "calc-imc", "triage", "form-a"]);
}

#[test]
fn test_high_bmi_selects_keyed_branch() {
    let steps = build_steps(&bmi_graph(), &accumulator_with_imc(27.78)).unwrap();
    let ids: Vec<&str> = steps.iter().map(|s| s.node_id.as_str()).collect();
    assert!(ids.contains(&"form-a"));
    assert!(!ids.contains(&"form-b"));
}

#[test]
fn test_low_bmi_falls_back_to_last_declared_edge() {
    let steps = build_steps(&bmi_graph(), &accumulator_with_imc(20.0)).unwrap();
    let ids: Vec<&str> = steps.iter().map(|s| s.node_id.as_str()).collect();
    assert!(ids.contains(&"form-b"));
    assert!(!ids.contains(&"form-a"));
}

#[test]
fn test_simple_rules_select_true_false_branches() {
    let definition = FlowDefinition {
        id: "simple-branch".to_string(),
        name: "Simple branch".to_string(),
        nodes: vec![
            FlowNode {
                id: "start".to_string(),
                config: NodeConfig::Start,
            },
            FlowNode {
                id: "q1".to_string(),
                config: NodeConfig::Question {
                    field: "age".to_string(),
                    title: "Age".to_string(),
                },
            },
            FlowNode {
                id: "gate".to_string(),
                config: NodeConfig::Conditions {
                    composites: vec![],
                    simple: vec![ConditionRule {
                        source: RuleSource::Question,
                        field: "age".to_string(),
                        operator: Operator::GreaterEqual,
                        value: json!(18),
                        value_end: None,
                    }],
                },
            },
            FlowNode {
                id: "adult".to_string(),
                config: NodeConfig::FormEnd {
                    title: "Adult".to_string(),
                },
            },
            FlowNode {
                id: "minor".to_string(),
                config: NodeConfig::FormEnd {
                    title: "Minor".to_string(),
                },
            },
            FlowNode {
                id: "end".to_string(),
                config: NodeConfig::End,
            },
        ],
        edges: vec![
            FlowEdge {
                id: "e1".to_string(),
                source: "start".to_string(),
                target: "q1".to_string(),
                branch: None,
            },
            FlowEdge {
                id: "e2".to_string(),
                source: "q1".to_string(),
                target: "gate".to_string(),
                branch: None,
            },
            FlowEdge {
                id: "e3".to_string(),
                source: "gate".to_string(),
                target: "adult".to_string(),
                branch: Some(BranchKey::OnTrue),
            },
            FlowEdge {
                id: "e4".to_string(),
                source: "gate".to_string(),
                target: "minor".to_string(),
                branch: Some(BranchKey::OnFalse),
            },
            FlowEdge {
                id: "e5".to_string(),
                source: "adult".to_string(),
                target: "end".to_string(),
                branch: None,
            },
            FlowEdge {
                id: "e6".to_string(),
                source: "minor".to_string(),
                target: "end".to_string(),
                branch: None,
            },
        ],
    };
    let graph = FlowGraph::new(definition).unwrap();

    let adult = ResponseAccumulator::new().with_user_response("age", json!(30));
    let ids: Vec<String> = build_steps(&graph, &adult)
        .unwrap()
        .into_iter()
        .map(|s| s.node_id)
        .collect();
    assert!(ids.contains(&"adult".to_string()));
    assert!(!ids.contains(&"minor".to_string()));

    let minor = ResponseAccumulator::new().with_user_response("age", json!(12));
    let ids: Vec<String> = build_steps(&graph, &minor)
        .unwrap()
        .into_iter()
        .map(|s| s.node_id)
        .collect();
    assert!(ids.contains(&"minor".to_string()));
    assert!(!ids.contains(&"adult".to_string()));
}

#[test]
fn test_traversal_budget_is_fatal() {
    // A small graph with a pathological number of parallel edges exhausts
    // the visit budget instead of truncating silently.
    let mut edges = Vec::new();
    edges.push(FlowEdge {
        id: "first".to_string(),
        source: "start".to_string(),
        target: "q1".to_string(),
        branch: None,
    });
    for i in 0..200 {
        edges.push(FlowEdge {
            id: format!("dup-{}", i),
            source: "start".to_string(),
            target: "q1".to_string(),
            branch: None,
        });
    }
    edges.push(FlowEdge {
        id: "last".to_string(),
        source: "q1".to_string(),
        target: "end".to_string(),
        branch: None,
    });

    let definition = FlowDefinition {
        id: "pathological".to_string(),
        name: "Pathological".to_string(),
        nodes: vec![
            FlowNode {
                id: "start".to_string(),
                config: NodeConfig::Start,
            },
            FlowNode {
                id: "q1".to_string(),
                config: NodeConfig::Question {
                    field: "x".to_string(),
                    title: "X".to_string(),
                },
            },
            FlowNode {
                id: "end".to_string(),
                config: NodeConfig::End,
            },
        ],
        edges,
    };
    let graph = FlowGraph::new(definition).unwrap();

    let result = build_steps(&graph, &ResponseAccumulator::new());
    assert!(matches!(
        result,
        Err(GraphError::TraversalBudgetExceeded { .. })
    ));
}

#[test]
fn test_cyclic_graph_terminates() {
    // A loop between two questions is bounded by the visited set: each node
    // materializes once and traversal ends.
    let definition = FlowDefinition {
        id: "cyclic".to_string(),
        name: "Cyclic".to_string(),
        nodes: vec![
            FlowNode {
                id: "start".to_string(),
                config: NodeConfig::Start,
            },
            FlowNode {
                id: "a".to_string(),
                config: NodeConfig::Question {
                    field: "a".to_string(),
                    title: "A".to_string(),
                },
            },
            FlowNode {
                id: "b".to_string(),
                config: NodeConfig::Question {
                    field: "b".to_string(),
                    title: "B".to_string(),
                },
            },
        ],
        edges: vec![
            FlowEdge {
                id: "e1".to_string(),
                source: "start".to_string(),
                target: "a".to_string(),
                branch: None,
            },
            FlowEdge {
                id: "e2".to_string(),
                source: "a".to_string(),
                target: "b".to_string(),
                branch: None,
            },
            FlowEdge {
                id: "e3".to_string(),
                source: "b".to_string(),
                target: "a".to_string(),
                branch: None,
            },
        ],
    };
    let graph = FlowGraph::new(definition).unwrap();
    let steps = build_steps(&graph, &ResponseAccumulator::new()).unwrap();
    assert_eq!(steps.len(), 2);
}

#[test]
fn test_merge_preserves_completed_history() {
    let graph = bmi_graph();
    let mut previous = build_steps(&graph, &ResponseAccumulator::new()).unwrap();

    let response = StepResponse::new()
        .with_answer("peso", json!(90))
        .with_answer("altura", json!(1.8));
    let completed_at = base_time() + Duration::minutes(5);
    previous[0].completed = true;
    previous[0].completed_at = Some(completed_at);
    previous[1].completed = true;
    previous[1].completed_at = Some(completed_at);
    previous[1].response = Some(response.clone());

    // The re-derived path now routes through form-b instead of form-a.
    let fresh = build_steps(&graph, &accumulator_with_imc(20.0)).unwrap();
    let merged = merge_steps(&previous, fresh);

    let calc = merged.iter().find(|s| s.node_id == "calc-imc").unwrap();
    assert!(calc.completed);
    assert_eq!(calc.response, Some(response));
    assert_eq!(calc.completed_at, Some(completed_at));

    let ids: Vec<&str> = merged.iter().map(|s| s.node_id.as_str()).collect();
    assert!(ids.contains(&"form-b"));
    assert!(!ids.contains(&"form-a"));
}

#[test]
fn test_merge_reassigns_order() {
    let graph = bmi_graph();
    let previous = build_steps(&graph, &ResponseAccumulator::new()).unwrap();
    let fresh = build_steps(&graph, &accumulator_with_imc(30.0)).unwrap();
    let merged = merge_steps(&previous, fresh);
    for (index, step) in merged.iter().enumerate() {
        assert_eq!(step.order, index as u32);
    }
}
