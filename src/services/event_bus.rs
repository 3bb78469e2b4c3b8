//! EventBus service for broadcasting workflow transitions to subscribers.
//!
//! A thin broadcast wrapper with monotonic sequence numbering, grounded on
//! the teacher's event bus but trimmed to this engine's event surface: no
//! persistence store, no cross-process dedup, no swarm/task event variants.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::models::ids::{ExecutionId, WorkflowId};
use crate::domain::models::principal::Principal;

/// Monotonically increasing sequence number assigned by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// The transition a [`WorkflowEvent`] reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowEventPayload {
    WorkflowRegistered {
        workflow_id: WorkflowId,
        phase_count: usize,
    },
    WorkflowExecutionStarted {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
    },
    PhaseStarted {
        execution_id: ExecutionId,
        phase_index: usize,
    },
    PhaseCompleted {
        execution_id: ExecutionId,
        phase_index: usize,
    },
    PhaseFailed {
        execution_id: ExecutionId,
        phase_index: usize,
        reason: String,
    },
    PhaseTimedOut {
        execution_id: ExecutionId,
        phase_index: usize,
    },
    ConditionalTriggerSet {
        execution_id: ExecutionId,
        phase_index: usize,
    },
    ConditionalTriggerActivated {
        execution_id: ExecutionId,
        phase_index: usize,
        source: Principal,
    },
    CoordinationPhaseStarted {
        execution_id: ExecutionId,
        phase_index: usize,
        required_responses: u32,
    },
    CoordinationResponseReceived {
        execution_id: ExecutionId,
        phase_index: usize,
        responder: Principal,
        received: u32,
        required: u32,
    },
    ContinuousMonitoringStarted {
        execution_id: ExecutionId,
        phase_index: usize,
        required_updates: u32,
    },
    MonitoringUpdateReceived {
        execution_id: ExecutionId,
        phase_index: usize,
        responder: Principal,
        received_updates: u32,
        required_updates: u32,
    },
    WorkflowCompleted {
        execution_id: ExecutionId,
        successful: bool,
    },
    WorkflowCreatorAuthorized {
        creator: Principal,
    },
    TriggerSourceAuthorized {
        source: Principal,
    },
}

/// A sequenced, timestamped transition emitted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub severity: EventSeverity,
    pub payload: WorkflowEventPayload,
}

/// Configuration for the [`EventBus`].
#[derive(Debug, Clone, Copy)]
pub struct EventBusConfig {
    /// Channel capacity for the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Central event bus broadcasting [`WorkflowEvent`]s to subscribers.
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
    sequence: AtomicU64,
}

impl EventBus {
    #[must_use]
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity);
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// Subscribe to the event stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, assigning the next sequence number.
    pub fn publish(&self, severity: EventSeverity, payload: WorkflowEventPayload) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let event = WorkflowEvent {
            sequence: SequenceNumber(seq),
            timestamp: Utc::now(),
            severity,
            payload,
        };
        // Broadcast errors mean no subscribers are listening; not a failure.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}
