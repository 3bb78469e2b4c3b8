//! Dependency scheduler (§4.3) — the heart of the engine.
//!
//! `try_advance` iterates phases in index order, dispatching every PENDING
//! phase whose dependencies are all COMPLETED, then determines whether the
//! execution as a whole has finished. Index-ordered iteration is what gives
//! the engine its determinism guarantee (P9): two implementations handed
//! the same execution state dispatch phases in the same order.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::errors::DomainResult;
use crate::domain::models::execution::{PhaseStatus, WorkflowExecution};
use crate::domain::models::workflow::WorkflowDefinition;
use crate::domain::ports::{OperatorRegistry, TaskMailbox};
use crate::services::event_bus::{EventBus, EventSeverity, WorkflowEventPayload};
use crate::services::phase_executors;

/// Dispatch every now-executable phase, then check for workflow completion.
///
/// No-op if the execution is already complete (I7).
pub async fn try_advance(
    execution: &mut WorkflowExecution,
    workflow: &WorkflowDefinition,
    mailbox: &Arc<dyn TaskMailbox>,
    operator_registry: &Arc<dyn OperatorRegistry>,
    event_bus: &EventBus,
) -> DomainResult<()> {
    if execution.is_complete {
        return Ok(());
    }

    let now = Utc::now();
    for index in 0..workflow.phases.len() {
        if execution.phase_statuses[index] != PhaseStatus::Pending {
            continue;
        }
        let phase = &workflow.phases[index];
        let dependencies_met = phase
            .dependencies
            .iter()
            .all(|&d| execution.phase_statuses[d] == PhaseStatus::Completed);
        if !dependencies_met {
            continue;
        }
        phase_executors::dispatch(
            execution,
            index,
            phase,
            now,
            mailbox,
            operator_registry,
            event_bus,
        )
        .await?;
    }

    check_workflow_completion(execution, event_bus);
    Ok(())
}

/// Determine whether the execution is now complete, per I4/I5.
pub fn check_workflow_completion(execution: &mut WorkflowExecution, event_bus: &EventBus) {
    if execution.is_complete {
        return;
    }
    if execution.any_phase_failed() {
        execution.is_complete = true;
        execution.successful = false;
        execution.completion_time = Some(Utc::now());
    } else if execution.all_phases_completed() {
        execution.is_complete = true;
        execution.successful = true;
        execution.completion_time = Some(Utc::now());
    } else {
        return;
    }

    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::WorkflowCompleted {
            execution_id: execution.execution_id,
            successful: execution.successful,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ids::{ContentId, ExecutionId, WorkflowId};
    use crate::domain::models::principal::Principal;
    use crate::domain::models::workflow::{OperatorSetId, PhaseDefinition, PhaseType};
    use crate::infrastructure::adapters::mailbox::InMemoryTaskMailbox;
    use crate::infrastructure::adapters::operator_registry::InMemoryOperatorRegistry;
    use std::collections::HashSet;

    fn immediate(name: &str, deps: Vec<usize>) -> PhaseDefinition {
        PhaseDefinition {
            name: name.to_string(),
            phase_type: PhaseType::Immediate,
            timeout_secs: 60,
            dependencies: deps,
            trigger_condition: None,
            operator_set_id: OperatorSetId(1),
            metadata: Vec::new(),
            required_stake: 0,
            consensus_threshold_bp: 0,
        }
    }

    fn workflow(phases: Vec<PhaseDefinition>) -> WorkflowDefinition {
        WorkflowDefinition {
            id: WorkflowId(ContentId([1u8; 32])),
            name: "wf".to_string(),
            creator: Principal::zero(),
            phases,
            authorized_triggers: HashSet::new(),
            total_stake: 0,
            is_active: true,
            creation_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn advances_a_chain_of_immediate_phases_to_completion() {
        let workflow = workflow(vec![
            immediate("p0", vec![]),
            immediate("p1", vec![0]),
            immediate("p2", vec![1]),
        ]);
        let mut execution = WorkflowExecution::new(
            ExecutionId(ContentId([2u8; 32])),
            workflow.id,
            vec![0xAA],
            Principal::zero(),
            workflow.phases.len(),
        );
        let mailbox: Arc<dyn TaskMailbox> = Arc::new(InMemoryTaskMailbox::default());
        let registry: Arc<dyn OperatorRegistry> = Arc::new(InMemoryOperatorRegistry::default());
        let bus = EventBus::default();

        try_advance(&mut execution, &workflow, &mailbox, &registry, &bus)
            .await
            .unwrap();

        assert!(execution.is_complete);
        assert!(execution.successful);
        assert!(execution
            .phase_statuses
            .iter()
            .all(|s| *s == PhaseStatus::Completed));
    }

    #[tokio::test]
    async fn does_not_dispatch_phases_whose_dependencies_are_unmet() {
        let workflow = workflow(vec![immediate("p0", vec![]), immediate("p1", vec![0])]);
        let mut execution = WorkflowExecution::new(
            ExecutionId(ContentId([3u8; 32])),
            workflow.id,
            vec![],
            Principal::zero(),
            workflow.phases.len(),
        );
        // manually leave p0 PENDING by never calling try_advance on it first;
        // instead verify a coordination-style phase blocks its dependent.
        execution.phase_statuses[0] = PhaseStatus::Active;
        let mailbox: Arc<dyn TaskMailbox> = Arc::new(InMemoryTaskMailbox::default());
        let registry: Arc<dyn OperatorRegistry> = Arc::new(InMemoryOperatorRegistry::default());
        let bus = EventBus::default();

        try_advance(&mut execution, &workflow, &mailbox, &registry, &bus)
            .await
            .unwrap();

        assert_eq!(execution.phase_statuses[1], PhaseStatus::Pending);
        assert!(!execution.is_complete);
    }

    #[tokio::test]
    async fn is_complete_is_idempotent() {
        let workflow = workflow(vec![immediate("p0", vec![])]);
        let mut execution = WorkflowExecution::new(
            ExecutionId(ContentId([4u8; 32])),
            workflow.id,
            vec![],
            Principal::zero(),
            1,
        );
        execution.is_complete = true;
        execution.phase_statuses[0] = PhaseStatus::Pending;
        let mailbox: Arc<dyn TaskMailbox> = Arc::new(InMemoryTaskMailbox::default());
        let registry: Arc<dyn OperatorRegistry> = Arc::new(InMemoryOperatorRegistry::default());
        let bus = EventBus::default();

        try_advance(&mut execution, &workflow, &mailbox, &registry, &bus)
            .await
            .unwrap();

        assert_eq!(execution.phase_statuses[0], PhaseStatus::Pending);
    }
}
