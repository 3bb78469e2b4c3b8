//! Timeout engine (§4.6). Polled rather than scheduled: callers invoke
//! `check_phase_timeout` and the engine decides whether the deadline has
//! actually passed.

use chrono::Utc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::execution::{PhaseStatus, WorkflowExecution};
use crate::services::event_bus::{EventBus, EventSeverity, WorkflowEventPayload};
use crate::services::scheduler::check_workflow_completion;

/// Transition phase `index` to TIMED_OUT if its deadline has passed.
///
/// # Errors
/// - [`DomainError::NoTimeoutSet`] if the phase never recorded a deadline
///   (it hasn't started yet).
/// - [`DomainError::NotYetTimedOut`] if `now` has not passed the deadline.
/// - [`DomainError::PhaseNotActive`] if the phase isn't ACTIVE or
///   CONDITIONAL_WAITING (already terminal, or still PENDING).
pub fn check_phase_timeout(
    execution: &mut WorkflowExecution,
    phase_index: usize,
    event_bus: &EventBus,
) -> DomainResult<()> {
    let deadline = execution
        .phase_deadlines
        .get(&phase_index)
        .copied()
        .ok_or(DomainError::NoTimeoutSet(phase_index))?;

    let now = Utc::now();
    if now <= deadline {
        return Err(DomainError::NotYetTimedOut(phase_index));
    }

    match execution.phase_statuses[phase_index] {
        PhaseStatus::Active | PhaseStatus::ConditionalWaiting => {}
        _ => return Err(DomainError::PhaseNotActive(phase_index)),
    }

    execution.phase_statuses[phase_index] = PhaseStatus::TimedOut;
    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::PhaseTimedOut {
            execution_id: execution.execution_id,
            phase_index,
        },
    );

    check_workflow_completion(execution, event_bus);
    Ok(())
}
