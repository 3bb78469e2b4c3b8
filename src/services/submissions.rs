//! Submission handlers (§4.5): coordination responses, monitoring updates,
//! and conditional triggers. Each may complete its phase; completion
//! re-invokes the scheduler so dependents become eligible in the same call.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::condition::TriggerCondition;
use crate::domain::models::execution::{PhaseStatus, WorkflowExecution};
use crate::domain::models::principal::Principal;
use crate::domain::models::workflow::WorkflowDefinition;
use crate::domain::ports::{OperatorRegistry, TaskMailbox};
use crate::services::event_bus::{EventBus, EventSeverity, WorkflowEventPayload};
use crate::services::phase_executors::complete_phase;
use crate::services::scheduler::try_advance;

/// Deterministic aggregation of coordination responses: concatenate each
/// responder's principal and response bytes in arrival order.
fn aggregate_coordination_responses(responses: &[(Principal, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (responder, response) in responses {
        out.extend_from_slice(&responder.0);
        out.extend_from_slice(&(response.len() as u32).to_le_bytes());
        out.extend_from_slice(response);
    }
    out
}

#[allow(clippy::too_many_arguments)]
pub async fn submit_coordination_response(
    execution: &mut WorkflowExecution,
    workflow: &WorkflowDefinition,
    phase_index: usize,
    responder: Principal,
    response: Vec<u8>,
    mailbox: &Arc<dyn TaskMailbox>,
    operator_registry: &Arc<dyn OperatorRegistry>,
    event_bus: &EventBus,
) -> DomainResult<()> {
    let state = execution
        .coordination_state
        .get_mut(&phase_index)
        .ok_or(DomainError::PhaseNotActive(phase_index))?;

    if state.received >= state.required_responses {
        return Err(DomainError::QuorumAlreadyMet(phase_index));
    }
    if execution.phase_statuses[phase_index] != PhaseStatus::Active {
        return Err(DomainError::PhaseNotActive(phase_index));
    }
    if !state.responders.insert(responder) {
        return Err(DomainError::DuplicateResponder(responder, phase_index));
    }
    state.received += 1;
    state.responses.push((responder, response));

    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::CoordinationResponseReceived {
            execution_id: execution.execution_id,
            phase_index,
            responder,
            received: state.received,
            required: state.required_responses,
        },
    );

    if state.received >= state.required_responses {
        let aggregated = aggregate_coordination_responses(&state.responses);
        complete_phase(execution, phase_index, aggregated, event_bus);
        try_advance(execution, workflow, mailbox, operator_registry, event_bus).await?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn submit_monitoring_update(
    execution: &mut WorkflowExecution,
    workflow: &WorkflowDefinition,
    phase_index: usize,
    operator: Principal,
    update: Vec<u8>,
    mailbox: &Arc<dyn TaskMailbox>,
    operator_registry: &Arc<dyn OperatorRegistry>,
    event_bus: &EventBus,
) -> DomainResult<()> {
    if execution.phase_statuses[phase_index] != PhaseStatus::Active {
        return Err(DomainError::PhaseNotActive(phase_index));
    }
    let now = Utc::now();
    let state = execution
        .continuous_state
        .get_mut(&phase_index)
        .ok_or(DomainError::PhaseNotActive(phase_index))?;

    if let Some(last) = state.last_update_at.get(&operator) {
        let elapsed = now.signed_duration_since(*last);
        if elapsed < chrono::Duration::from_std(state.update_interval).unwrap_or_default() {
            return Err(DomainError::UpdateTooFrequent(phase_index));
        }
    }

    state.last_update_at.insert(operator, now);
    state.received_updates += 1;
    state.log.push((operator, update));

    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::MonitoringUpdateReceived {
            execution_id: execution.execution_id,
            phase_index,
            responder: operator,
            received_updates: state.received_updates,
            required_updates: state.required_updates,
        },
    );

    if state.received_updates >= state.required_updates {
        let encoded = serde_json::to_vec(&state.log)?;
        complete_phase(execution, phase_index, encoded, event_bus);
        try_advance(execution, workflow, mailbox, operator_registry, event_bus).await?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn trigger_conditional_phase(
    execution: &mut WorkflowExecution,
    workflow: &WorkflowDefinition,
    phase_index: usize,
    caller: Principal,
    trigger_data: Vec<u8>,
    is_globally_authorized: bool,
    mailbox: &Arc<dyn TaskMailbox>,
    operator_registry: &Arc<dyn OperatorRegistry>,
    event_bus: &EventBus,
) -> DomainResult<()> {
    if execution.phase_statuses[phase_index] != PhaseStatus::ConditionalWaiting {
        return Err(DomainError::PhaseNotActive(phase_index));
    }
    let authorized = caller == workflow.creator
        || workflow.authorized_triggers.contains(&caller)
        || is_globally_authorized;
    if !authorized {
        return Err(DomainError::NotAuthorizedTrigger(caller, workflow.id));
    }

    let state = execution
        .conditional_trigger
        .get(&phase_index)
        .ok_or(DomainError::PhaseNotActive(phase_index))?;
    if state.triggered {
        return Err(DomainError::AlreadyTriggered(phase_index));
    }

    let condition = TriggerCondition::decode(&state.condition)
        .map_err(|_| DomainError::InvalidTriggerCondition(phase_index))?;
    let satisfied = condition
        .evaluate(&trigger_data, Utc::now().timestamp())
        .map_err(|_| DomainError::InvalidTriggerCondition(phase_index))?;
    if !satisfied {
        return Err(DomainError::InvalidTriggerCondition(phase_index));
    }

    let state = execution
        .conditional_trigger
        .get_mut(&phase_index)
        .expect("checked above");
    state.triggered = true;
    state.trigger_time = Some(Utc::now());
    state.trigger_source = Some(caller);
    state.trigger_data = Some(trigger_data.clone());

    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::ConditionalTriggerActivated {
            execution_id: execution.execution_id,
            phase_index,
            source: caller,
        },
    );

    complete_phase(execution, phase_index, trigger_data, event_bus);
    try_advance(execution, workflow, mailbox, operator_registry, event_bus).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ids::{ContentId, ExecutionId, WorkflowId};
    use crate::domain::models::workflow::{OperatorSetId, PhaseDefinition, PhaseType};
    use crate::infrastructure::adapters::mailbox::InMemoryTaskMailbox;
    use crate::infrastructure::adapters::operator_registry::InMemoryOperatorRegistry;
    use std::collections::HashSet;

    fn coordination_workflow(threshold_bp: u32) -> WorkflowDefinition {
        let phase = PhaseDefinition {
            name: "coord".to_string(),
            phase_type: PhaseType::Coordination,
            timeout_secs: 60,
            dependencies: vec![],
            trigger_condition: None,
            operator_set_id: OperatorSetId(1),
            metadata: Vec::new(),
            required_stake: 0,
            consensus_threshold_bp: threshold_bp,
        };
        WorkflowDefinition {
            id: WorkflowId(ContentId([5u8; 32])),
            name: "wf".to_string(),
            creator: Principal::zero(),
            phases: vec![phase],
            authorized_triggers: HashSet::new(),
            total_stake: 0,
            is_active: true,
            creation_time: Utc::now(),
        }
    }

    async fn collaborators() -> (Arc<dyn TaskMailbox>, Arc<dyn OperatorRegistry>, EventBus) {
        (
            Arc::new(InMemoryTaskMailbox::default()),
            Arc::new(InMemoryOperatorRegistry::with_default(5)),
            EventBus::default(),
        )
    }

    #[tokio::test]
    async fn quorum_completes_after_required_responses_then_rejects_extra() {
        let workflow = coordination_workflow(6667); // ceil(5*0.6667)=3 (floor)
        let mut execution = WorkflowExecution::new(
            ExecutionId(ContentId([6u8; 32])),
            workflow.id,
            vec![],
            Principal::zero(),
            1,
        );
        let (mailbox, registry, bus) = collaborators().await;
        try_advance(&mut execution, &workflow, &mailbox, &registry, &bus)
            .await
            .unwrap();
        assert_eq!(
            execution.coordination_state.get(&0).unwrap().required_responses,
            3
        );

        for i in 0..3u8 {
            submit_coordination_response(
                &mut execution,
                &workflow,
                0,
                Principal::from_bytes(&[i]),
                vec![i],
                &mailbox,
                &registry,
                &bus,
            )
            .await
            .unwrap();
        }
        assert_eq!(execution.phase_statuses[0], PhaseStatus::Completed);
        assert!(execution.is_complete);
        assert!(execution.successful);

        let fourth = submit_coordination_response(
            &mut execution,
            &workflow,
            0,
            Principal::from_bytes(&[9]),
            vec![9],
            &mailbox,
            &registry,
            &bus,
        )
        .await;
        assert!(matches!(fourth, Err(DomainError::QuorumAlreadyMet(0))));
    }

    #[tokio::test]
    async fn duplicate_responder_is_rejected() {
        let workflow = coordination_workflow(10_000);
        let mut execution = WorkflowExecution::new(
            ExecutionId(ContentId([7u8; 32])),
            workflow.id,
            vec![],
            Principal::zero(),
            1,
        );
        let (mailbox, registry, bus) = collaborators().await;
        try_advance(&mut execution, &workflow, &mailbox, &registry, &bus)
            .await
            .unwrap();

        let responder = Principal::from_bytes(&[1]);
        submit_coordination_response(
            &mut execution,
            &workflow,
            0,
            responder,
            vec![1],
            &mailbox,
            &registry,
            &bus,
        )
        .await
        .unwrap();

        let second = submit_coordination_response(
            &mut execution,
            &workflow,
            0,
            responder,
            vec![2],
            &mailbox,
            &registry,
            &bus,
        )
        .await;
        assert!(matches!(second, Err(DomainError::DuplicateResponder(_, _))));
    }

    #[tokio::test]
    async fn conditional_trigger_rejects_unsatisfied_condition() {
        let phase = PhaseDefinition {
            name: "cond".to_string(),
            phase_type: PhaseType::Conditional,
            timeout_secs: 60,
            dependencies: vec![],
            trigger_condition: Some(
                TriggerCondition::PriceThreshold {
                    threshold: 5000,
                    is_greater: true,
                }
                .encode(),
            ),
            operator_set_id: OperatorSetId(1),
            metadata: Vec::new(),
            required_stake: 0,
            consensus_threshold_bp: 0,
        };
        let workflow = WorkflowDefinition {
            id: WorkflowId(ContentId([8u8; 32])),
            name: "wf".to_string(),
            creator: Principal::zero(),
            phases: vec![phase],
            authorized_triggers: HashSet::new(),
            total_stake: 0,
            is_active: true,
            creation_time: Utc::now(),
        };
        let mut execution = WorkflowExecution::new(
            ExecutionId(ContentId([9u8; 32])),
            workflow.id,
            vec![],
            Principal::zero(),
            1,
        );
        let (mailbox, registry, bus) = collaborators().await;
        try_advance(&mut execution, &workflow, &mailbox, &registry, &bus)
            .await
            .unwrap();

        let below = trigger_conditional_phase(
            &mut execution,
            &workflow,
            0,
            Principal::zero(),
            4000i128.to_le_bytes().to_vec(),
            false,
            &mailbox,
            &registry,
            &bus,
        )
        .await;
        assert!(matches!(
            below,
            Err(DomainError::InvalidTriggerCondition(_))
        ));

        trigger_conditional_phase(
            &mut execution,
            &workflow,
            0,
            Principal::zero(),
            5000i128.to_le_bytes().to_vec(),
            false,
            &mailbox,
            &registry,
            &bus,
        )
        .await
        .unwrap();
        assert_eq!(execution.phase_statuses[0], PhaseStatus::Completed);
    }
}
