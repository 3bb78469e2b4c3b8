//! Domain errors for the workflow orchestration engine.

use thiserror::Error;

use crate::domain::models::ids::{ExecutionId, WorkflowId};
use crate::domain::models::principal::Principal;

/// Domain-level errors that can occur while registering or executing a workflow.
#[derive(Debug, Error)]
pub enum DomainError {
    // --- Validation ---
    #[error("workflow name must not be empty")]
    EmptyName,

    #[error("phase count {0} is out of range (1..=50)")]
    PhaseCountOutOfRange(usize),

    #[error("phase {phase_index} declares an invalid dependency on {dependency_index}")]
    InvalidDependency {
        phase_index: usize,
        dependency_index: usize,
    },

    #[error("phase {0} has a zero or missing timeout")]
    InvalidTimeout(usize),

    #[error("consensus threshold {0} basis points is out of range (1..=10000)")]
    InvalidConsensusThreshold(u32),

    // --- Authorization ---
    #[error("principal {0} is not authorized to perform this action")]
    Unauthorized(Principal),

    #[error("principal {0} is not the creator of workflow {1}")]
    NotWorkflowCreator(Principal, WorkflowId),

    #[error("principal {0} is not an authorized trigger source for workflow {1}")]
    NotAuthorizedTrigger(Principal, WorkflowId),

    // --- Economic ---
    #[error("insufficient fee: required {required}, received {received}")]
    InsufficientFee { required: u128, received: u128 },

    // --- Existence ---
    #[error("workflow not found: {0}")]
    WorkflowNotFound(WorkflowId),

    #[error("execution not found: {0}")]
    ExecutionNotFound(ExecutionId),

    #[error("workflow {0} is not active")]
    WorkflowInactive(WorkflowId),

    // --- State ---
    #[error("phase {0} is not active")]
    PhaseNotActive(usize),

    #[error("principal {0} has already responded to phase {1}")]
    DuplicateResponder(Principal, usize),

    #[error("phase {0} has already reached quorum")]
    QuorumAlreadyMet(usize),

    #[error("monitoring update for phase {0} arrived before the minimum interval elapsed")]
    UpdateTooFrequent(usize),

    #[error("conditional phase {0} has already been triggered")]
    AlreadyTriggered(usize),

    #[error("phase {0} has no timeout recorded")]
    NoTimeoutSet(usize),

    #[error("phase {0} has not yet exceeded its timeout")]
    NotYetTimedOut(usize),

    // --- Semantic ---
    #[error("phase {0} carries an invalid or unsupported trigger condition")]
    InvalidTriggerCondition(usize),

    // --- Terminal ---
    #[error("phase {0} failed")]
    PhaseFailed(usize),

    #[error("phase {0} timed out")]
    PhaseTimedOut(usize),

    // --- Infrastructure passthrough ---
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("collaborator call failed: {0}")]
    CollaboratorError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
