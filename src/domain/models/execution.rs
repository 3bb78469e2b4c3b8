//! Workflow execution — the mutable per-run state tracked against an
//! immutable [`super::workflow::WorkflowDefinition`].
//!
//! Grounded on the teacher's `WorkflowInstance`/`PhaseInstance` split
//! (immutable blueprint vs. mutable runtime state), with the per-phase
//! runtime state reshaped into flattened, phase-indexed fields per the
//! "nested keyed state" guidance this engine follows instead of carrying
//! maps of maps of maps.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ExecutionId, WorkflowId};
use super::principal::Principal;

/// Status of a single phase within a [`WorkflowExecution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    Active,
    /// CONDITIONAL phases only; analogous to `Active` but armed for an
    /// external trigger rather than coordination/continuous submissions.
    ConditionalWaiting,
    Completed,
    Failed,
    TimedOut,
}

impl PhaseStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::ConditionalWaiting => "conditional_waiting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        };
        write!(f, "{s}")
    }
}

/// Per-phase runtime state for a COORDINATION phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationState {
    pub required_responses: u32,
    pub received: u32,
    pub responders: HashSet<Principal>,
    /// Response bytes in arrival order, paired with their sender.
    pub responses: Vec<(Principal, Vec<u8>)>,
}

impl CoordinationState {
    #[must_use]
    pub fn new(required_responses: u32) -> Self {
        Self {
            required_responses,
            received: 0,
            responders: HashSet::new(),
            responses: Vec::new(),
        }
    }
}

/// Per-phase runtime state for a CONTINUOUS phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousState {
    pub update_interval: Duration,
    pub required_updates: u32,
    pub received_updates: u32,
    pub last_update_at: HashMap<Principal, DateTime<Utc>>,
    /// Updates in arrival order, paired with their sender.
    pub log: Vec<(Principal, Vec<u8>)>,
}

impl ContinuousState {
    #[must_use]
    pub fn new(update_interval: Duration, required_updates: u32) -> Self {
        Self {
            update_interval,
            required_updates,
            received_updates: 0,
            last_update_at: HashMap::new(),
            log: Vec::new(),
        }
    }
}

/// Per-phase runtime state for a CONDITIONAL phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalTriggerState {
    /// Opaque-encoded [`super::condition::TriggerCondition`].
    pub condition: Vec<u8>,
    pub triggered: bool,
    pub trigger_time: Option<DateTime<Utc>>,
    pub trigger_source: Option<Principal>,
    pub trigger_data: Option<Vec<u8>>,
}

impl ConditionalTriggerState {
    #[must_use]
    pub fn new(condition: Vec<u8>) -> Self {
        Self {
            condition,
            triggered: false,
            trigger_time: None,
            trigger_source: None,
            trigger_data: None,
        }
    }
}

/// A live instance of a workflow. Mutated only under the execution's lock
/// (see the concurrency model in [`crate::services::execution_store`]);
/// becomes immutable once `is_complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub initial_payload: Vec<u8>,
    pub initiator: Principal,
    pub phase_statuses: Vec<PhaseStatus>,
    pub phase_results: HashMap<usize, Vec<u8>>,
    pub phase_start_times: HashMap<usize, DateTime<Utc>>,
    pub phase_deadlines: HashMap<usize, DateTime<Utc>>,
    pub coordination_state: HashMap<usize, CoordinationState>,
    pub continuous_state: HashMap<usize, ContinuousState>,
    pub conditional_trigger: HashMap<usize, ConditionalTriggerState>,
    pub is_complete: bool,
    pub successful: bool,
    pub completion_time: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    /// Create a freshly-started execution with every phase PENDING (I1).
    #[must_use]
    pub fn new(
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        initial_payload: Vec<u8>,
        initiator: Principal,
        phase_count: usize,
    ) -> Self {
        Self {
            execution_id,
            workflow_id,
            initial_payload,
            initiator,
            phase_statuses: vec![PhaseStatus::Pending; phase_count],
            phase_results: HashMap::new(),
            phase_start_times: HashMap::new(),
            phase_deadlines: HashMap::new(),
            coordination_state: HashMap::new(),
            continuous_state: HashMap::new(),
            conditional_trigger: HashMap::new(),
            is_complete: false,
            successful: false,
            completion_time: None,
        }
    }

    /// True once every phase is in a terminal state (I4 precondition).
    #[must_use]
    pub fn all_phases_terminal(&self) -> bool {
        self.phase_statuses.iter().all(|s| s.is_terminal())
    }

    /// True iff every phase has COMPLETED (I4).
    #[must_use]
    pub fn all_phases_completed(&self) -> bool {
        self.phase_statuses
            .iter()
            .all(|s| *s == PhaseStatus::Completed)
    }

    /// True if any phase is FAILED or TIMED_OUT (I5).
    #[must_use]
    pub fn any_phase_failed(&self) -> bool {
        self.phase_statuses
            .iter()
            .any(|s| matches!(s, PhaseStatus::Failed | PhaseStatus::TimedOut))
    }
}
