//! External collaborators the engine consults but does not own.
//!
//! Grounded on the teacher's repository-trait pattern (`AgentRepository`,
//! `GoalRepository`, ...): each external system the engine depends on is a
//! `Send + Sync` async trait, injected at construction, so the core never
//! hard-codes a transport.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::principal::Principal;
use crate::domain::models::workflow::OperatorSetId;

/// A request to dispatch an IMMEDIATE phase's task to the external mailbox.
#[derive(Debug, Clone)]
pub struct MailboxTaskRequest {
    pub refund_collector: Principal,
    pub avs_fee: u128,
    pub initiator: Principal,
    pub operator_set_id: OperatorSetId,
    pub payload: Vec<u8>,
}

/// Opaque handle returned by the mailbox for a dispatched task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle(pub Vec<u8>);

/// Downstream task dispatcher consulted by the IMMEDIATE executor.
#[async_trait]
pub trait TaskMailbox: Send + Sync {
    async fn create_task(&self, request: MailboxTaskRequest) -> DomainResult<TaskHandle>;
}

/// Operator pool lookup consulted by the COORDINATION executor.
#[async_trait]
pub trait OperatorRegistry: Send + Sync {
    /// Total operator count for the given set, used to derive the quorum
    /// requirement from a basis-points threshold.
    async fn operator_count(&self, operator_set_id: OperatorSetId) -> DomainResult<u32>;
}

/// Fee custody sink. Write-only from the core's perspective.
#[async_trait]
pub trait FeeSink: Send + Sync {
    async fn transfer(&self, amount: u128) -> DomainResult<()>;
}
