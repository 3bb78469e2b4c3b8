//! Workflow registry — validates and stores immutable workflow definitions.
//!
//! Workflow definitions are immutable after registration and may be read
//! concurrently, so the registry holds them behind a single `RwLock` over
//! the whole map rather than one lock per definition.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ids::WorkflowId;
use crate::domain::models::principal::Principal;
use crate::domain::models::workflow::{PhaseDefinition, WorkflowDefinition};
use crate::domain::ports::FeeSink;
use crate::services::event_bus::{EventBus, EventSeverity, WorkflowEventPayload};

/// Owns the set of registered workflow definitions and the admin-gated
/// authorization tables (authorized creators, authorized trigger sources).
pub struct WorkflowRegistry {
    definitions: RwLock<HashMap<WorkflowId, Arc<WorkflowDefinition>>>,
    authorized_creators: RwLock<HashSet<Principal>>,
    authorized_trigger_sources: RwLock<HashSet<Principal>>,
    creation_fee: RwLock<u128>,
    fee_sink: Arc<dyn FeeSink>,
    event_bus: Arc<EventBus>,
    nonce: std::sync::atomic::AtomicU64,
}

impl WorkflowRegistry {
    #[must_use]
    pub fn new(fee_sink: Arc<dyn FeeSink>, event_bus: Arc<EventBus>, creation_fee: u128) -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            authorized_creators: RwLock::new(HashSet::new()),
            authorized_trigger_sources: RwLock::new(HashSet::new()),
            creation_fee: RwLock::new(creation_fee),
            fee_sink,
            event_bus,
            nonce: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Grant a principal permission to register workflows.
    pub async fn authorize_creator(&self, creator: Principal) {
        self.authorized_creators.write().await.insert(creator);
        self.event_bus.publish(
            EventSeverity::Info,
            WorkflowEventPayload::WorkflowCreatorAuthorized { creator },
        );
    }

    /// Grant a principal permission to fire CONDITIONAL phases on any workflow.
    pub async fn authorize_trigger_source(&self, source: Principal) {
        self.authorized_trigger_sources
            .write()
            .await
            .insert(source);
        self.event_bus.publish(
            EventSeverity::Info,
            WorkflowEventPayload::TriggerSourceAuthorized { source },
        );
    }

    pub async fn set_creation_fee(&self, fee: u128) {
        *self.creation_fee.write().await = fee;
    }

    /// Register a new workflow. Validates the phase DAG, persists the
    /// definition, and forwards the creation fee.
    pub async fn register_workflow(
        &self,
        creator: Principal,
        name: String,
        phases: Vec<PhaseDefinition>,
        authorized_triggers: HashSet<Principal>,
        fee_paid: u128,
    ) -> DomainResult<WorkflowId> {
        if !self.authorized_creators.read().await.contains(&creator) {
            return Err(DomainError::Unauthorized(creator));
        }
        let required_fee = *self.creation_fee.read().await;
        if fee_paid < required_fee {
            return Err(DomainError::InsufficientFee {
                required: required_fee,
                received: fee_paid,
            });
        }
        WorkflowDefinition::validate_phases(&name, &phases)?;

        let creation_time = Utc::now();
        let nonce = self.nonce.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let id = WorkflowId::derive(&name, creator, creation_time, nonce);
        let total_stake = WorkflowDefinition::total_stake(&phases);
        let phase_count = phases.len();

        let definition = WorkflowDefinition {
            id,
            name,
            creator,
            phases,
            authorized_triggers,
            total_stake,
            is_active: true,
            creation_time,
        };

        self.definitions
            .write()
            .await
            .insert(id, Arc::new(definition));

        self.fee_sink.transfer(fee_paid).await?;

        self.event_bus.publish(
            EventSeverity::Info,
            WorkflowEventPayload::WorkflowRegistered {
                workflow_id: id,
                phase_count,
            },
        );

        Ok(id)
    }

    pub async fn get(&self, id: WorkflowId) -> Option<Arc<WorkflowDefinition>> {
        self.definitions.read().await.get(&id).cloned()
    }

    pub async fn is_authorized_trigger(&self, workflow: &WorkflowDefinition, caller: Principal) -> bool {
        caller == workflow.creator
            || workflow.authorized_triggers.contains(&caller)
            || self
                .authorized_trigger_sources
                .read()
                .await
                .contains(&caller)
    }
}
