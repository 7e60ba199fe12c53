use careflow::delay::format_remaining;
use careflow::execution::CurrentStep;
use careflow::prelude::*;
use chrono::Utc;
use clap::Parser;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;

/// A deterministic flow execution engine CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the flow definition JSON file
    flow_path: String,

    /// Optional path to a scripted answers JSON file (node id -> answers map)
    answers_path: Option<String>,

    /// Patient identifier for the simulated execution
    #[arg(short, long, default_value = "patient-demo")]
    patient: String,

    /// Only validate the flow definition, without simulating an execution
    #[arg(long)]
    validate_only: bool,

    /// Prompt for answers interactively instead of reading a script
    #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
    human: bool,
}

fn main() {
    let cli = Cli::parse();
    let total_start = Instant::now();

    // --- 1. File loading and validation ---
    let load_start = Instant::now();
    let flow_json = fs::read_to_string(&cli.flow_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read flow file '{}': {}", &cli.flow_path, e))
    });
    let definition: FlowDefinition = serde_json::from_str(&flow_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse flow JSON: {}", e)));

    let graph = FlowGraph::new(definition)
        .unwrap_or_else(|e| exit_with_error(&format!("Flow validation failed: {}", e)));
    let load_duration = load_start.elapsed();

    println!(
        "Flow '{}' ({}) validated: {} nodes, start at '{}'",
        graph.name(),
        graph.id(),
        graph.node_count(),
        graph.start_id()
    );

    if cli.validate_only {
        println!("Validation took {:?}", load_duration);
        return;
    }

    // Scripted answers, keyed by node id. Interactive mode prompts instead.
    let script: BTreeMap<String, BTreeMap<String, Value>> = match &cli.answers_path {
        Some(path) => {
            let answers_json = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read answers file '{}': {}", path, e))
            });
            serde_json::from_str(&answers_json)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse answers JSON: {}", e)))
        }
        None => BTreeMap::new(),
    };

    // --- 2. Execution simulation ---
    let flow_id = graph.id().to_string();
    let mut engine = FlowEngine::new(MemoryStore::new());
    engine.register_flow(graph);

    println!("\nStarting execution for patient '{}'...", cli.patient);
    let (execution, events) = engine
        .create_execution(&flow_id, &cli.patient)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to create execution: {}", e)));
    dispatch_events(&TracingSink, &events);

    let execution_id = execution.id;
    loop {
        let current = engine
            .get_current_step(execution_id)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to read current step: {}", e)));

        match current {
            CurrentStep::Finished => {
                println!("\nExecution finished!");
                break;
            }
            CurrentStep::NotYetAvailable { available_at } => {
                println!(
                    "\nExecution paused on a delay; next step available in {} (at {})",
                    format_remaining(available_at, Utc::now()),
                    available_at
                );
                break;
            }
            CurrentStep::Available(step) => {
                println!("\nCurrent step: '{}' ({})", step.title, step.node_id);
                let response = if cli.human {
                    prompt_for_response(&step)
                } else {
                    scripted_response(&script, &step.node_id)
                };
                let (_, events) = engine
                    .complete_step(execution_id, &step.node_id, response)
                    .unwrap_or_else(|e| {
                        exit_with_error(&format!("Failed to complete '{}': {}", step.node_id, e))
                    });
                dispatch_events(&TracingSink, &events);
            }
        }
    }

    // --- 3. Summary ---
    let final_state = engine
        .store()
        .load(execution_id)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to reload execution: {}", e)));

    println!("\n--- Execution Summary ---");
    println!("Status:          {}", final_state.status);
    println!("Steps on path:   {}", final_state.steps.len());
    let completed = final_state.steps.iter().filter(|s| s.completed).count();
    println!("Steps completed: {}", completed);
    if !final_state.accumulator.calculator_results.is_empty() {
        println!("Calculated fields:");
        for (field, value) in &final_state.accumulator.calculator_results {
            println!("  {} = {}", field, value);
        }
    }
    println!("-------------------------");
    println!("Total Execution: {:?}", total_start.elapsed());
}

/// Looks up the scripted answers for a node; steps without a script entry are
/// completed with an empty response.
fn scripted_response(
    script: &BTreeMap<String, BTreeMap<String, Value>>,
    node_id: &str,
) -> StepResponse {
    let mut response = StepResponse::new();
    if let Some(answers) = script.get(node_id) {
        for (field, value) in answers {
            println!("  answering {} = {}", field, value);
            response = response.with_answer(field.as_str(), value.clone());
        }
    }
    response
}

/// Prompts for a single free-form answer per step. Numeric input is recorded
/// as a number so calculator formulas can consume it.
fn prompt_for_response(step: &FlowStep) -> StepResponse {
    if !matches!(step.node_type, NodeType::Question | NodeType::Calculator) {
        let _ = prompt_for_input("Press enter to continue", None);
        return StepResponse::new();
    }

    let field = prompt_for_input("Field name", Some(&step.node_id));
    let raw = prompt_for_input("Answer", None);
    let value = raw
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::String(raw));
    StepResponse::new().with_answer(field, value)
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout().flush().unwrap();

    io::stdin()
        .read_line(&mut line)
        .expect("Failed to read line");
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
