//! Common test utilities for building flow definitions and executions.
use careflow::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

/// A fixed timestamp for deterministic machine-level tests.
#[allow(dead_code)]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Routes engine logs into the test harness output. Safe to call from every
/// test; only the first call installs the subscriber.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn edge(id: &str, source: &str, target: &str) -> FlowEdge {
    FlowEdge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        branch: None,
    }
}

/// A linear flow without branching:
/// `start -> formStart(f1) -> question(q1) -> formEnd(f2) -> end`
#[allow(dead_code)]
pub fn linear_flow() -> FlowDefinition {
    FlowDefinition {
        id: "linear".to_string(),
        name: "Linear protocol".to_string(),
        nodes: vec![
            FlowNode {
                id: "start".to_string(),
                config: NodeConfig::Start,
            },
            FlowNode {
                id: "f1".to_string(),
                config: NodeConfig::FormStart {
                    title: "Intake".to_string(),
                },
            },
            FlowNode {
                id: "q1".to_string(),
                config: NodeConfig::Question {
                    field: "mood".to_string(),
                    title: "How do you feel?".to_string(),
                },
            },
            FlowNode {
                id: "f2".to_string(),
                config: NodeConfig::FormEnd {
                    title: "Done".to_string(),
                },
            },
            FlowNode {
                id: "end".to_string(),
                config: NodeConfig::End,
            },
        ],
        edges: vec![
            edge("e1", "start", "f1"),
            edge("e2", "f1", "q1"),
            edge("e3", "q1", "f2"),
            edge("e4", "f2", "end"),
        ],
    }
}

/// The BMI triage flow:
/// `start -> formStart -> calculator(imc = peso / altura^2)
///        -> conditions(imc > 25 -> formEnd_A, else formEnd_B) -> end`
#[allow(dead_code)]
pub fn bmi_flow() -> FlowDefinition {
    FlowDefinition {
        id: "bmi-check".to_string(),
        name: "BMI triage".to_string(),
        nodes: vec![
            FlowNode {
                id: "start".to_string(),
                config: NodeConfig::Start,
            },
            FlowNode {
                id: "intake".to_string(),
                config: NodeConfig::FormStart {
                    title: "Intake".to_string(),
                },
            },
            FlowNode {
                id: "calc-imc".to_string(),
                config: NodeConfig::Calculator {
                    result_field: "imc".to_string(),
                    formula: "peso / (altura * altura)".to_string(),
                    fields: vec!["peso".to_string(), "altura".to_string()],
                },
            },
            FlowNode {
                id: "triage".to_string(),
                config: NodeConfig::Conditions {
                    composites: vec![CompositeCondition {
                        id: "c-high".to_string(),
                        label: "High BMI".to_string(),
                        logic: Logic::And,
                        rules: vec![ConditionRule {
                            source: RuleSource::Calculation,
                            field: "imc".to_string(),
                            operator: Operator::Greater,
                            value: json!(25),
                            value_end: None,
                        }],
                    }],
                    simple: vec![],
                },
            },
            FlowNode {
                id: "form-a".to_string(),
                config: NodeConfig::FormEnd {
                    title: "Overweight plan".to_string(),
                },
            },
            FlowNode {
                id: "form-b".to_string(),
                config: NodeConfig::FormEnd {
                    title: "Standard plan".to_string(),
                },
            },
            FlowNode {
                id: "end".to_string(),
                config: NodeConfig::End,
            },
        ],
        edges: vec![
            edge("e1", "start", "intake"),
            edge("e2", "intake", "calc-imc"),
            edge("e3", "calc-imc", "triage"),
            FlowEdge {
                id: "e4".to_string(),
                source: "triage".to_string(),
                target: "form-a".to_string(),
                branch: Some(BranchKey::Condition("c-high".to_string())),
            },
            edge("e5", "triage", "form-b"),
            edge("e6", "form-a", "end"),
            edge("e7", "form-b", "end"),
        ],
    }
}

/// A flow pausing two days between check-in and a follow-up question:
/// `start -> formStart -> delay(2 days) -> question -> end`
#[allow(dead_code)]
pub fn delayed_flow() -> FlowDefinition {
    FlowDefinition {
        id: "followup".to_string(),
        name: "Delayed follow-up".to_string(),
        nodes: vec![
            FlowNode {
                id: "start".to_string(),
                config: NodeConfig::Start,
            },
            FlowNode {
                id: "checkin".to_string(),
                config: NodeConfig::FormStart {
                    title: "Check-in".to_string(),
                },
            },
            FlowNode {
                id: "wait".to_string(),
                config: NodeConfig::Delay {
                    amount: 2,
                    unit: DelayUnit::Days,
                },
            },
            FlowNode {
                id: "q-mood".to_string(),
                config: NodeConfig::Question {
                    field: "mood".to_string(),
                    title: "How do you feel today?".to_string(),
                },
            },
            FlowNode {
                id: "end".to_string(),
                config: NodeConfig::End,
            },
        ],
        edges: vec![
            edge("e1", "start", "checkin"),
            edge("e2", "checkin", "wait"),
            edge("e3", "wait", "q-mood"),
            edge("e4", "q-mood", "end"),
        ],
    }
}

/// A flow whose high-risk branch is malformed: the `review` node fans out
/// into hundreds of duplicate edges, exhausting the traversal budget. The
/// branch is only selected once `risk >= 1` has been answered, so creation
/// (which follows the first declared edge) succeeds and the error surfaces
/// mid-life. With `with_delay`, a two-day delay sits between the question
/// and the branch so the error is only reachable through a poll.
#[allow(dead_code)]
pub fn misconfigured_branch_flow(with_delay: bool) -> FlowDefinition {
    let mut nodes = vec![
        FlowNode {
            id: "start".to_string(),
            config: NodeConfig::Start,
        },
        FlowNode {
            id: "q-risk".to_string(),
            config: NodeConfig::Question {
                field: "risk".to_string(),
                title: "Risk score".to_string(),
            },
        },
        FlowNode {
            id: "gate".to_string(),
            config: NodeConfig::Conditions {
                composites: vec![],
                simple: vec![ConditionRule {
                    source: RuleSource::Question,
                    field: "risk".to_string(),
                    operator: Operator::GreaterEqual,
                    value: json!(1),
                    value_end: None,
                }],
            },
        },
        FlowNode {
            id: "safe".to_string(),
            config: NodeConfig::FormEnd {
                title: "Standard plan".to_string(),
            },
        },
        FlowNode {
            id: "review".to_string(),
            config: NodeConfig::Question {
                field: "review".to_string(),
                title: "Manual review".to_string(),
            },
        },
        FlowNode {
            id: "end".to_string(),
            config: NodeConfig::End,
        },
    ];
    let mut edges = vec![edge("e1", "start", "q-risk")];
    if with_delay {
        nodes.push(FlowNode {
            id: "wait".to_string(),
            config: NodeConfig::Delay {
                amount: 2,
                unit: DelayUnit::Days,
            },
        });
        edges.push(edge("e2", "q-risk", "wait"));
        edges.push(edge("e3", "wait", "gate"));
    } else {
        edges.push(edge("e2", "q-risk", "gate"));
    }
    edges.push(FlowEdge {
        id: "e-safe".to_string(),
        source: "gate".to_string(),
        target: "safe".to_string(),
        branch: Some(BranchKey::OnFalse),
    });
    edges.push(FlowEdge {
        id: "e-review".to_string(),
        source: "gate".to_string(),
        target: "review".to_string(),
        branch: Some(BranchKey::OnTrue),
    });
    edges.push(edge("e-safe-end", "safe", "end"));
    for i in 0..400 {
        edges.push(edge(&format!("dup-{}", i), "review", "end"));
    }
    FlowDefinition {
        id: "risk-triage".to_string(),
        name: "Risk triage".to_string(),
        nodes,
        edges,
    }
}

#[allow(dead_code)]
pub fn bmi_graph() -> FlowGraph {
    FlowGraph::new(bmi_flow()).unwrap()
}

#[allow(dead_code)]
pub fn linear_graph() -> FlowGraph {
    FlowGraph::new(linear_flow()).unwrap()
}

#[allow(dead_code)]
pub fn delayed_graph() -> FlowGraph {
    FlowGraph::new(delayed_flow()).unwrap()
}

/// Accumulator with a single calculator result, as left behind by a
/// completed BMI calculation.
#[allow(dead_code)]
pub fn accumulator_with_imc(imc: f64) -> ResponseAccumulator {
    ResponseAccumulator::new().with_calculator_result("imc", imc)
}
