//! Outbound dispatch boundary for notification and delay-continuation
//! collaborators.
//!
//! The engine returns [`EngineEvent`]s from its transitions instead of
//! performing I/O; the caller forwards them through an [`EventSink`].
//! Delivery, retries and templating are entirely the collaborator's
//! responsibility, and a sink must never make a transition fail.

use crate::execution::EngineEvent;
use crate::flow::NodeType;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

/// Collaborator interface for notify-worthy step arrivals and delayed
/// continuation hints.
pub trait EventSink {
    /// A notify-worthy step became the current, immediately available step.
    fn on_step_arrived(
        &self,
        execution_id: Uuid,
        patient_id: &str,
        node_id: &str,
        node_type: NodeType,
        title: &str,
    );

    /// The execution should be re-polled at or after `available_at`.
    fn schedule_check(&self, execution_id: Uuid, available_at: DateTime<Utc>);
}

/// Forwards a batch of engine events to a sink, fire-and-forget.
pub fn dispatch_events(sink: &dyn EventSink, events: &[EngineEvent]) {
    for event in events {
        match event {
            EngineEvent::StepArrived {
                execution_id,
                patient_id,
                node_id,
                node_type,
                title,
            } => sink.on_step_arrived(*execution_id, patient_id, node_id, *node_type, title),
            EngineEvent::ScheduleCheck {
                execution_id,
                available_at,
            } => sink.schedule_check(*execution_id, *available_at),
        }
    }
}

/// Default sink that only logs; useful as a stand-in before a real
/// notification collaborator is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_step_arrived(
        &self,
        execution_id: Uuid,
        patient_id: &str,
        node_id: &str,
        node_type: NodeType,
        title: &str,
    ) {
        info!(
            %execution_id,
            patient_id,
            node_id,
            %node_type,
            title,
            "step arrived"
        );
    }

    fn schedule_check(&self, execution_id: Uuid, available_at: DateTime<Utc>) {
        info!(%execution_id, %available_at, "continuation check requested");
    }
}
