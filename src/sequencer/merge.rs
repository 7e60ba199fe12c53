use crate::execution::FlowStep;
use ahash::AHashMap;

/// Reconciles a freshly derived step list with the previous one.
///
/// Matching is by `node_id`. Completed steps keep their recorded `response`,
/// `completed_at` and `available_at` untouched even when the surrounding path
/// changed shape; pending steps keep a previously assigned `available_at` so
/// a running delay is not restarted by a rebuild. Steps that fell off the
/// newly selected path are dropped from the list — their answers survive in
/// the accumulator.
pub fn merge_steps(previous: &[FlowStep], fresh: Vec<FlowStep>) -> Vec<FlowStep> {
    let by_id: AHashMap<&str, &FlowStep> = previous
        .iter()
        .map(|step| (step.node_id.as_str(), step))
        .collect();

    fresh
        .into_iter()
        .enumerate()
        .map(|(index, mut step)| {
            step.order = index as u32;
            if let Some(prior) = by_id.get(step.node_id.as_str()) {
                step.available_at = prior.available_at;
                if prior.completed {
                    step.completed = true;
                    step.response = prior.response.clone();
                    step.completed_at = prior.completed_at;
                }
            }
            step
        })
        .collect()
}
