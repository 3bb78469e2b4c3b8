//! Workflow definition — the immutable DAG of phases registered once and
//! executed any number of times.
//!
//! Grounded on the teacher's `WorkflowDefinition`/`PhaseDefinition` shape
//! (an immutable blueprint of phases plus a dependency graph), adapted to
//! the five phase disciplines and consensus/trigger configuration this
//! engine requires instead of the teacher's task-definition-per-phase model.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::WorkflowId;
use super::principal::Principal;
use crate::domain::errors::{DomainError, DomainResult};

/// Maximum number of phases a workflow may declare.
pub const MAX_PHASES: usize = 50;
/// Maximum number of dependencies a single phase may declare.
pub const MAX_DEPENDENCIES: usize = 10;
/// Denominator for consensus thresholds expressed in basis points.
pub const BASIS_POINTS: u32 = 10_000;

/// Identifier for an operator pool, looked up via [`crate::domain::ports::OperatorRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorSetId(pub u64);

/// The execution discipline a phase follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseType {
    /// Dispatches a task to the external mailbox and completes synchronously.
    Immediate,
    /// Waits for a quorum of operator responses.
    Coordination,
    /// Waits for a target number of periodic operator updates.
    Continuous,
    /// Waits for an external trigger satisfying a stored condition.
    Conditional,
    /// Synchronously aggregates the results of its dependencies.
    Aggregation,
}

/// A single phase within a [`WorkflowDefinition`].
///
/// Value type; validated wholesale at registration and never mutated
/// afterwards (dependencies strictly precede the phase by index, so the
/// phase list as a whole is a DAG in topological order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub name: String,
    pub phase_type: PhaseType,
    /// Positive duration, in seconds, the phase may run once ACTIVE.
    pub timeout_secs: u64,
    /// Indices into the owning workflow's `phases`, each strictly less than
    /// this phase's own index.
    pub dependencies: Vec<usize>,
    /// Required when `phase_type == Conditional`; opaque encoding of a
    /// [`super::condition::TriggerCondition`].
    pub trigger_condition: Option<Vec<u8>>,
    pub operator_set_id: OperatorSetId,
    /// Opaque metadata; decoded per phase type at dispatch time (see
    /// [`super::condition::ContinuousMetadata`] for CONTINUOUS phases).
    pub metadata: Vec<u8>,
    /// Informational minimum operator stake; not enforced by the core.
    pub required_stake: u128,
    /// Required and validated only when `phase_type == Coordination`.
    pub consensus_threshold_bp: u32,
}

impl PhaseDefinition {
    fn validate(&self, index: usize) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        if self.timeout_secs == 0 {
            return Err(DomainError::InvalidTimeout(index));
        }
        if self.dependencies.len() > MAX_DEPENDENCIES {
            return Err(DomainError::InvalidDependency {
                phase_index: index,
                dependency_index: self.dependencies.len(),
            });
        }
        for &dep in &self.dependencies {
            if dep >= index {
                return Err(DomainError::InvalidDependency {
                    phase_index: index,
                    dependency_index: dep,
                });
            }
        }
        if self.phase_type == PhaseType::Coordination
            && !(1..=BASIS_POINTS).contains(&self.consensus_threshold_bp)
        {
            return Err(DomainError::InvalidConsensusThreshold(
                self.consensus_threshold_bp,
            ));
        }
        if self.phase_type == PhaseType::Conditional && self.trigger_condition.is_none() {
            return Err(DomainError::ValidationFailed(format!(
                "phase {index} is CONDITIONAL but declares no trigger_condition"
            )));
        }
        Ok(())
    }
}

/// An immutable, registered workflow: a DAG of phases plus the principals
/// authorized to fire its CONDITIONAL phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub name: String,
    pub creator: Principal,
    pub phases: Vec<PhaseDefinition>,
    pub authorized_triggers: HashSet<Principal>,
    /// Sum of `required_stake` across all phases; informational only.
    pub total_stake: u128,
    /// Carried in the data model; no operation in this engine flips it back.
    pub is_active: bool,
    pub creation_time: DateTime<Utc>,
}

impl WorkflowDefinition {
    /// Validate a phase list against the registration-time invariants:
    /// non-empty name, phase count in range, and per-phase checks.
    pub fn validate_phases(name: &str, phases: &[PhaseDefinition]) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        if phases.is_empty() || phases.len() > MAX_PHASES {
            return Err(DomainError::PhaseCountOutOfRange(phases.len()));
        }
        for (index, phase) in phases.iter().enumerate() {
            phase.validate(index)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn total_stake(phases: &[PhaseDefinition]) -> u128 {
        phases.iter().map(|p| p.required_stake).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(phase_type: PhaseType, deps: Vec<usize>) -> PhaseDefinition {
        PhaseDefinition {
            name: "phase".to_string(),
            phase_type,
            timeout_secs: 60,
            dependencies: deps,
            trigger_condition: if phase_type == PhaseType::Conditional {
                Some(vec![0])
            } else {
                None
            },
            operator_set_id: OperatorSetId(1),
            metadata: Vec::new(),
            required_stake: 0,
            consensus_threshold_bp: if phase_type == PhaseType::Coordination {
                5000
            } else {
                0
            },
        }
    }

    #[test]
    fn rejects_empty_name() {
        let phases = vec![phase(PhaseType::Immediate, vec![])];
        assert!(matches!(
            WorkflowDefinition::validate_phases("", &phases),
            Err(DomainError::EmptyName)
        ));
    }

    #[test]
    fn rejects_too_many_phases() {
        let phases: Vec<_> = (0..MAX_PHASES + 1)
            .map(|_| phase(PhaseType::Immediate, vec![]))
            .collect();
        assert!(matches!(
            WorkflowDefinition::validate_phases("wf", &phases),
            Err(DomainError::PhaseCountOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_forward_dependency() {
        let phases = vec![
            phase(PhaseType::Immediate, vec![]),
            phase(PhaseType::Immediate, vec![2]),
            phase(PhaseType::Immediate, vec![]),
        ];
        assert!(matches!(
            WorkflowDefinition::validate_phases("wf", &phases),
            Err(DomainError::InvalidDependency { .. })
        ));
    }

    #[test]
    fn rejects_bad_consensus_threshold() {
        let mut coord = phase(PhaseType::Coordination, vec![]);
        coord.consensus_threshold_bp = 0;
        assert!(matches!(
            WorkflowDefinition::validate_phases("wf", &[coord]),
            Err(DomainError::InvalidConsensusThreshold(_))
        ));
    }

    #[test]
    fn accepts_valid_chain() {
        let phases = vec![
            phase(PhaseType::Immediate, vec![]),
            phase(PhaseType::Coordination, vec![0]),
            phase(PhaseType::Aggregation, vec![0, 1]),
        ];
        assert!(WorkflowDefinition::validate_phases("wf", &phases).is_ok());
    }
}
