//! The five phase executor strategies (§4.4).
//!
//! Reshaped from polymorphic dispatch into one function per [`PhaseType`]
//! variant, invoked through an exhaustive match in [`dispatch`] — a tagged
//! variant over phase type with one executor per arm, per the reshaping
//! guidance this engine follows instead of open inheritance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::condition::ContinuousMetadata;
use crate::domain::models::execution::{
    CoordinationState, ConditionalTriggerState, ContinuousState, PhaseStatus, WorkflowExecution,
};
use crate::domain::models::principal::Principal;
use crate::domain::models::workflow::PhaseDefinition;
use crate::domain::ports::{MailboxTaskRequest, OperatorRegistry, TaskMailbox};
use crate::services::event_bus::{EventBus, EventSeverity, WorkflowEventPayload};

/// Fallback operator count for COORDINATION when the registry has no
/// record of the set, kept for reference parity with the source system.
pub const DEFAULT_OPERATOR_COUNT_FALLBACK: u32 = 5;

#[derive(Debug, Serialize, Deserialize)]
struct ImmediateContext {
    initial_payload: Vec<u8>,
    dependency_results: Vec<Vec<u8>>,
    metadata: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AggregatedResult {
    dependency_results: Vec<Vec<u8>>,
}

/// Dispatch phase `index` according to its declared [`PhaseType`]. Called by
/// the scheduler once every dependency is COMPLETED.
#[allow(clippy::too_many_arguments)]
pub async fn dispatch(
    execution: &mut WorkflowExecution,
    index: usize,
    phase: &PhaseDefinition,
    now: DateTime<Utc>,
    mailbox: &Arc<dyn TaskMailbox>,
    operator_registry: &Arc<dyn OperatorRegistry>,
    event_bus: &EventBus,
) -> DomainResult<()> {
    use crate::domain::models::workflow::PhaseType;

    match phase.phase_type {
        PhaseType::Conditional => {
            execution.phase_statuses[index] = PhaseStatus::ConditionalWaiting;
        }
        _ => {
            execution.phase_statuses[index] = PhaseStatus::Active;
        }
    }
    execution.phase_start_times.insert(index, now);
    execution.phase_deadlines.insert(
        index,
        now + chrono::Duration::seconds(phase.timeout_secs as i64),
    );
    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::PhaseStarted {
            execution_id: execution.execution_id,
            phase_index: index,
        },
    );

    match phase.phase_type {
        PhaseType::Immediate => dispatch_immediate(execution, index, phase, mailbox, event_bus).await,
        PhaseType::Coordination => {
            dispatch_coordination(execution, index, phase, operator_registry, event_bus).await
        }
        PhaseType::Continuous => dispatch_continuous(execution, index, phase, event_bus),
        PhaseType::Conditional => dispatch_conditional(execution, index, phase, event_bus),
        PhaseType::Aggregation => dispatch_aggregation(execution, index, phase, event_bus),
    }
}

async fn dispatch_immediate(
    execution: &mut WorkflowExecution,
    index: usize,
    phase: &PhaseDefinition,
    mailbox: &Arc<dyn TaskMailbox>,
    event_bus: &EventBus,
) -> DomainResult<()> {
    let dependency_results: Vec<Vec<u8>> = phase
        .dependencies
        .iter()
        .map(|d| execution.phase_results.get(d).cloned().unwrap_or_default())
        .collect();

    let context = ImmediateContext {
        initial_payload: execution.initial_payload.clone(),
        dependency_results,
        metadata: phase.metadata.clone(),
    };
    let payload = serde_json::to_vec(&context)?;

    let handle = mailbox
        .create_task(MailboxTaskRequest {
            refund_collector: execution.initiator,
            avs_fee: 0,
            initiator: execution.initiator,
            operator_set_id: phase.operator_set_id,
            payload,
        })
        .await?;

    complete_phase(execution, index, handle.0, event_bus);
    Ok(())
}

async fn dispatch_coordination(
    execution: &mut WorkflowExecution,
    index: usize,
    phase: &PhaseDefinition,
    operator_registry: &Arc<dyn OperatorRegistry>,
    event_bus: &EventBus,
) -> DomainResult<()> {
    let total = operator_registry
        .operator_count(phase.operator_set_id)
        .await
        .unwrap_or(DEFAULT_OPERATOR_COUNT_FALLBACK);
    let required = (u64::from(total) * u64::from(phase.consensus_threshold_bp)
        / u64::from(crate::domain::models::workflow::BASIS_POINTS)) as u32;

    execution
        .coordination_state
        .insert(index, CoordinationState::new(required));

    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::CoordinationPhaseStarted {
            execution_id: execution.execution_id,
            phase_index: index,
            required_responses: required,
        },
    );
    Ok(())
}

fn dispatch_continuous(
    execution: &mut WorkflowExecution,
    index: usize,
    phase: &PhaseDefinition,
    event_bus: &EventBus,
) -> DomainResult<()> {
    let meta = ContinuousMetadata::decode(&phase.metadata)?;
    execution.continuous_state.insert(
        index,
        ContinuousState::new(
            std::time::Duration::from_secs(meta.update_interval_secs),
            meta.required_updates,
        ),
    );

    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::ContinuousMonitoringStarted {
            execution_id: execution.execution_id,
            phase_index: index,
            required_updates: meta.required_updates,
        },
    );
    Ok(())
}

fn dispatch_conditional(
    execution: &mut WorkflowExecution,
    index: usize,
    phase: &PhaseDefinition,
    event_bus: &EventBus,
) -> DomainResult<()> {
    let condition = phase
        .trigger_condition
        .clone()
        .expect("CONDITIONAL phases are validated to carry a trigger_condition");
    execution
        .conditional_trigger
        .insert(index, ConditionalTriggerState::new(condition));

    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::ConditionalTriggerSet {
            execution_id: execution.execution_id,
            phase_index: index,
        },
    );
    Ok(())
}

fn dispatch_aggregation(
    execution: &mut WorkflowExecution,
    index: usize,
    phase: &PhaseDefinition,
    event_bus: &EventBus,
) -> DomainResult<()> {
    let dependency_results: Vec<Vec<u8>> = phase
        .dependencies
        .iter()
        .map(|d| {
            execution
                .phase_results
                .get(d)
                .cloned()
                .expect("dependency is COMPLETED per I2, so its result is set")
        })
        .collect();

    let aggregated = AggregatedResult { dependency_results };
    let encoded = serde_json::to_vec(&aggregated)?;
    complete_phase(execution, index, encoded, event_bus);
    Ok(())
}

/// Mark a phase COMPLETED and record its result (I3).
pub fn complete_phase(
    execution: &mut WorkflowExecution,
    index: usize,
    result: Vec<u8>,
    event_bus: &EventBus,
) {
    execution.phase_statuses[index] = PhaseStatus::Completed;
    execution.phase_results.insert(index, result);
    event_bus.publish(
        EventSeverity::Info,
        WorkflowEventPayload::PhaseCompleted {
            execution_id: execution.execution_id,
            phase_index: index,
        },
    );
}

/// Mark a phase FAILED (workflow-terminal, §7).
pub fn fail_phase(
    execution: &mut WorkflowExecution,
    index: usize,
    reason: String,
    event_bus: &EventBus,
) {
    execution.phase_statuses[index] = PhaseStatus::Failed;
    event_bus.publish(
        EventSeverity::Error,
        WorkflowEventPayload::PhaseFailed {
            execution_id: execution.execution_id,
            phase_index: index,
            reason,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ids::{ContentId, ExecutionId, WorkflowId};
    use crate::domain::models::workflow::{OperatorSetId, PhaseType};
    use crate::infrastructure::adapters::mailbox::InMemoryTaskMailbox;
    use crate::infrastructure::adapters::operator_registry::InMemoryOperatorRegistry;

    fn fresh_execution(phase_count: usize) -> WorkflowExecution {
        WorkflowExecution::new(
            ExecutionId(ContentId([9u8; 32])),
            WorkflowId(ContentId([8u8; 32])),
            vec![0xAA],
            Principal::zero(),
            phase_count,
        )
    }

    fn immediate_phase() -> PhaseDefinition {
        PhaseDefinition {
            name: "p0".to_string(),
            phase_type: PhaseType::Immediate,
            timeout_secs: 60,
            dependencies: vec![],
            trigger_condition: None,
            operator_set_id: OperatorSetId(1),
            metadata: Vec::new(),
            required_stake: 0,
            consensus_threshold_bp: 0,
        }
    }

    #[tokio::test]
    async fn immediate_completes_synchronously() {
        let mut execution = fresh_execution(1);
        let phase = immediate_phase();
        let mailbox: Arc<dyn TaskMailbox> = Arc::new(InMemoryTaskMailbox::default());
        let registry: Arc<dyn OperatorRegistry> = Arc::new(InMemoryOperatorRegistry::default());
        let bus = EventBus::default();

        dispatch(&mut execution, 0, &phase, Utc::now(), &mailbox, &registry, &bus)
            .await
            .unwrap();

        assert_eq!(execution.phase_statuses[0], PhaseStatus::Completed);
        assert!(execution.phase_results.contains_key(&0));
    }

    #[tokio::test]
    async fn coordination_computes_required_from_threshold() {
        let mut execution = fresh_execution(1);
        let mut phase = immediate_phase();
        phase.phase_type = PhaseType::Coordination;
        phase.consensus_threshold_bp = 6667;
        let mailbox: Arc<dyn TaskMailbox> = Arc::new(InMemoryTaskMailbox::default());
        let registry: Arc<dyn OperatorRegistry> =
            Arc::new(InMemoryOperatorRegistry::with_default(5));
        let bus = EventBus::default();

        dispatch(&mut execution, 0, &phase, Utc::now(), &mailbox, &registry, &bus)
            .await
            .unwrap();

        assert_eq!(execution.phase_statuses[0], PhaseStatus::Active);
        let state = execution.coordination_state.get(&0).unwrap();
        assert_eq!(state.required_responses, 3);
    }

    #[tokio::test]
    async fn conditional_goes_to_conditional_waiting() {
        use crate::domain::models::condition::TriggerCondition;

        let mut execution = fresh_execution(1);
        let mut phase = immediate_phase();
        phase.phase_type = PhaseType::Conditional;
        phase.trigger_condition = Some(TriggerCondition::None.encode());
        let mailbox: Arc<dyn TaskMailbox> = Arc::new(InMemoryTaskMailbox::default());
        let registry: Arc<dyn OperatorRegistry> = Arc::new(InMemoryOperatorRegistry::default());
        let bus = EventBus::default();

        dispatch(&mut execution, 0, &phase, Utc::now(), &mailbox, &registry, &bus)
            .await
            .unwrap();

        assert_eq!(execution.phase_statuses[0], PhaseStatus::ConditionalWaiting);
        assert!(execution.conditional_trigger.contains_key(&0));
    }

    #[tokio::test]
    async fn aggregation_collects_dependency_results_in_order() {
        let mut execution = fresh_execution(3);
        execution.phase_results.insert(0, vec![1]);
        execution.phase_results.insert(1, vec![2]);
        let mut phase = immediate_phase();
        phase.phase_type = PhaseType::Aggregation;
        phase.dependencies = vec![0, 1];
        let mailbox: Arc<dyn TaskMailbox> = Arc::new(InMemoryTaskMailbox::default());
        let registry: Arc<dyn OperatorRegistry> = Arc::new(InMemoryOperatorRegistry::default());
        let bus = EventBus::default();

        dispatch(&mut execution, 2, &phase, Utc::now(), &mailbox, &registry, &bus)
            .await
            .unwrap();

        assert_eq!(execution.phase_statuses[2], PhaseStatus::Completed);
        let result: AggregatedResult =
            serde_json::from_slice(&execution.phase_results[&2]).unwrap();
        assert_eq!(result.dependency_results, vec![vec![1], vec![2]]);
    }
}
