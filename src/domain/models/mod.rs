//! Domain models
//!
//! Pure domain entities with business logic and validation rules.
//! These models are framework-agnostic and contain no infrastructure concerns.

pub mod condition;
pub mod execution;
pub mod ids;
pub mod principal;
pub mod workflow;

pub use condition::{ContinuousMetadata, TriggerCondition};
pub use execution::{
    CoordinationState, ConditionalTriggerState, ContinuousState, PhaseStatus, WorkflowExecution,
};
pub use ids::{ContentId, ExecutionId, WorkflowId};
pub use principal::Principal;
pub use workflow::{
    OperatorSetId, PhaseDefinition, PhaseType, WorkflowDefinition, BASIS_POINTS, MAX_DEPENDENCIES,
    MAX_PHASES,
};
