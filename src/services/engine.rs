//! `WorkflowEngine` — the facade an embedder (RPC service, on-chain call
//! surface, CLI) drives. Combines the registry, the execution store, the
//! event bus, and the three external collaborators behind the public
//! operations this system exposes.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::execution::{PhaseStatus, WorkflowExecution};
use crate::domain::models::ids::{ExecutionId, WorkflowId};
use crate::domain::models::principal::Principal;
use crate::domain::models::workflow::{PhaseDefinition, WorkflowDefinition};
use crate::domain::ports::{FeeSink, OperatorRegistry, TaskMailbox};
use crate::infrastructure::config::EngineConfig;
use crate::services::event_bus::{EventBus, EventSeverity, WorkflowEventPayload};
use crate::services::execution_store::ExecutionStore;
use crate::services::registry::WorkflowRegistry;
use crate::services::{scheduler, submissions, timeout};

/// Owns every stateful collaborator the engine needs and exposes the
/// public operation surface as plain async methods over them.
pub struct WorkflowEngine {
    registry: WorkflowRegistry,
    executions: ExecutionStore,
    mailbox: Arc<dyn TaskMailbox>,
    operator_registry: Arc<dyn OperatorRegistry>,
    fee_sink: Arc<dyn FeeSink>,
    event_bus: Arc<EventBus>,
    execution_fee: tokio::sync::RwLock<u128>,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(
        config: &EngineConfig,
        mailbox: Arc<dyn TaskMailbox>,
        operator_registry: Arc<dyn OperatorRegistry>,
        fee_sink: Arc<dyn FeeSink>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            registry: WorkflowRegistry::new(
                fee_sink.clone(),
                event_bus.clone(),
                config.fees.creation_fee,
            ),
            executions: ExecutionStore::new(),
            mailbox,
            operator_registry,
            fee_sink,
            event_bus,
            execution_fee: tokio::sync::RwLock::new(config.fees.execution_fee),
        }
    }

    // --- Admin operations -------------------------------------------------

    pub async fn authorize_workflow_creator(&self, creator: Principal) {
        self.registry.authorize_creator(creator).await;
    }

    pub async fn authorize_trigger_source(&self, source: Principal) {
        self.registry.authorize_trigger_source(source).await;
    }

    pub async fn set_fees(&self, creation_fee: u128, execution_fee: u128) {
        self.registry.set_creation_fee(creation_fee).await;
        *self.execution_fee.write().await = execution_fee;
    }

    // --- Registration and execution ---------------------------------------

    pub async fn register_workflow(
        &self,
        creator: Principal,
        name: String,
        phases: Vec<PhaseDefinition>,
        authorized_triggers: HashSet<Principal>,
        fee_paid: u128,
    ) -> DomainResult<WorkflowId> {
        self.registry
            .register_workflow(creator, name, phases, authorized_triggers, fee_paid)
            .await
    }

    pub async fn execute_workflow(
        &self,
        workflow_id: WorkflowId,
        initiator: Principal,
        initial_payload: Vec<u8>,
        fee_paid: u128,
        nonce: u64,
    ) -> DomainResult<ExecutionId> {
        let workflow = self
            .registry
            .get(workflow_id)
            .await
            .ok_or(DomainError::WorkflowNotFound(workflow_id))?;
        if !workflow.is_active {
            return Err(DomainError::WorkflowInactive(workflow_id));
        }

        let required_fee = *self.execution_fee.read().await;
        if fee_paid < required_fee {
            return Err(DomainError::InsufficientFee {
                required: required_fee,
                received: fee_paid,
            });
        }

        let started_at = Utc::now();
        let execution_id = ExecutionId::derive(workflow_id, initiator, started_at, nonce);
        let mut execution = WorkflowExecution::new(
            execution_id,
            workflow_id,
            initial_payload,
            initiator,
            workflow.phases.len(),
        );

        self.fee_sink.transfer(fee_paid).await?;

        self.event_bus.publish(
            EventSeverity::Info,
            WorkflowEventPayload::WorkflowExecutionStarted {
                execution_id,
                workflow_id,
            },
        );

        scheduler::try_advance(
            &mut execution,
            &workflow,
            &self.mailbox,
            &self.operator_registry,
            &self.event_bus,
        )
        .await?;

        self.executions.insert(execution).await;
        Ok(execution_id)
    }

    // --- Submissions --------------------------------------------------------

    pub async fn submit_coordination_response(
        &self,
        execution_id: ExecutionId,
        phase_index: usize,
        responder: Principal,
        response: Vec<u8>,
    ) -> DomainResult<()> {
        let handle = self.executions.get_handle(execution_id).await?;
        let workflow = self.workflow_for(&handle).await?;
        let mut execution = handle.write().await;
        submissions::submit_coordination_response(
            &mut execution,
            &workflow,
            phase_index,
            responder,
            response,
            &self.mailbox,
            &self.operator_registry,
            &self.event_bus,
        )
        .await
    }

    pub async fn submit_monitoring_update(
        &self,
        execution_id: ExecutionId,
        phase_index: usize,
        operator: Principal,
        update: Vec<u8>,
    ) -> DomainResult<()> {
        let handle = self.executions.get_handle(execution_id).await?;
        let workflow = self.workflow_for(&handle).await?;
        let mut execution = handle.write().await;
        submissions::submit_monitoring_update(
            &mut execution,
            &workflow,
            phase_index,
            operator,
            update,
            &self.mailbox,
            &self.operator_registry,
            &self.event_bus,
        )
        .await
    }

    pub async fn trigger_conditional_phase(
        &self,
        execution_id: ExecutionId,
        phase_index: usize,
        caller: Principal,
        trigger_data: Vec<u8>,
    ) -> DomainResult<()> {
        let handle = self.executions.get_handle(execution_id).await?;
        let workflow = self.workflow_for(&handle).await?;
        let is_globally_authorized = self.registry.is_authorized_trigger(&workflow, caller).await;
        let mut execution = handle.write().await;
        submissions::trigger_conditional_phase(
            &mut execution,
            &workflow,
            phase_index,
            caller,
            trigger_data,
            is_globally_authorized,
            &self.mailbox,
            &self.operator_registry,
            &self.event_bus,
        )
        .await
    }

    pub async fn check_phase_timeout(
        &self,
        execution_id: ExecutionId,
        phase_index: usize,
    ) -> DomainResult<()> {
        let handle = self.executions.get_handle(execution_id).await?;
        let mut execution = handle.write().await;
        timeout::check_phase_timeout(&mut execution, phase_index, &self.event_bus)
    }

    // --- View queries --------------------------------------------------------

    pub async fn get_workflow(&self, id: WorkflowId) -> DomainResult<Arc<WorkflowDefinition>> {
        self.registry.get(id).await.ok_or(DomainError::WorkflowNotFound(id))
    }

    pub async fn get_execution(&self, id: ExecutionId) -> DomainResult<WorkflowExecution> {
        self.executions.snapshot(id).await
    }

    pub async fn get_phase_status(
        &self,
        execution_id: ExecutionId,
        phase_index: usize,
    ) -> DomainResult<PhaseStatus> {
        let execution = self.executions.snapshot(execution_id).await?;
        execution
            .phase_statuses
            .get(phase_index)
            .copied()
            .ok_or(DomainError::PhaseNotActive(phase_index))
    }

    pub async fn get_phase_result(
        &self,
        execution_id: ExecutionId,
        phase_index: usize,
    ) -> DomainResult<Option<Vec<u8>>> {
        let execution = self.executions.snapshot(execution_id).await?;
        Ok(execution.phase_results.get(&phase_index).cloned())
    }

    async fn workflow_for(
        &self,
        handle: &Arc<tokio::sync::RwLock<WorkflowExecution>>,
    ) -> DomainResult<Arc<WorkflowDefinition>> {
        let workflow_id = handle.read().await.workflow_id;
        self.registry
            .get(workflow_id)
            .await
            .ok_or(DomainError::WorkflowNotFound(workflow_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::workflow::{OperatorSetId, PhaseType};
    use crate::infrastructure::adapters::fee_sink::InMemoryFeeSink;
    use crate::infrastructure::adapters::mailbox::InMemoryTaskMailbox;
    use crate::infrastructure::adapters::operator_registry::InMemoryOperatorRegistry;

    fn immediate_phase(name: &str, deps: Vec<usize>) -> PhaseDefinition {
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

    fn engine() -> WorkflowEngine {
        let config = EngineConfig::default();
        WorkflowEngine::new(
            &config,
            Arc::new(InMemoryTaskMailbox::default()),
            Arc::new(InMemoryOperatorRegistry::default()),
            Arc::new(InMemoryFeeSink::default()),
            Arc::new(EventBus::default()),
        )
    }

    #[tokio::test]
    async fn full_immediate_chain_runs_to_completion() {
        let engine = engine();
        let creator = Principal::from_bytes(b"creator");
        engine.authorize_workflow_creator(creator).await;

        let workflow_id = engine
            .register_workflow(
                creator,
                "release".to_string(),
                vec![immediate_phase("build", vec![]), immediate_phase("deploy", vec![0])],
                HashSet::new(),
                0,
            )
            .await
            .unwrap();

        let execution_id = engine
            .execute_workflow(workflow_id, creator, vec![1, 2, 3], 0, 0)
            .await
            .unwrap();

        let execution = engine.get_execution(execution_id).await.unwrap();
        assert!(execution.is_complete);
        assert!(execution.successful);
    }

    #[tokio::test]
    async fn executing_unknown_workflow_is_reported() {
        let engine = engine();
        let result = engine
            .execute_workflow(
                WorkflowId(crate::domain::models::ids::ContentId([0xFF; 32])),
                Principal::zero(),
                vec![],
                0,
                0,
            )
            .await;
        assert!(matches!(result, Err(DomainError::WorkflowNotFound(_))));
    }
}
