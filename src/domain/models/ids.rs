//! Content-addressed identifiers.
//!
//! Workflow and execution ids are derived deterministically from their
//! creation inputs (name/workflow, creator/initiator, timestamp, nonce)
//! rather than assigned by a counter, so two independent implementations
//! given the same inputs compute the same id (property P9).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::principal::Principal;

/// A 32-byte content-addressed identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub [u8; 32]);

impl ContentId {
    fn derive(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Identifier for a [`super::workflow::WorkflowDefinition`].
///
/// `hash(name, creator, creation_time, nonce)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkflowId(pub ContentId);

impl WorkflowId {
    #[must_use]
    pub fn derive(name: &str, creator: Principal, creation_time: DateTime<Utc>, nonce: u64) -> Self {
        Self(ContentId::derive(&[
            name.as_bytes(),
            &creator.0,
            &creation_time.timestamp_nanos_opt().unwrap_or_default().to_le_bytes(),
            &nonce.to_le_bytes(),
        ]))
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a [`super::execution::WorkflowExecution`].
///
/// `hash(workflow_id, initiator, timestamp, nonce)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExecutionId(pub ContentId);

impl ExecutionId {
    #[must_use]
    pub fn derive(
        workflow_id: WorkflowId,
        initiator: Principal,
        timestamp: DateTime<Utc>,
        nonce: u64,
    ) -> Self {
        Self(ContentId::derive(&[
            &workflow_id.0 .0,
            &initiator.0,
            &timestamp.timestamp_nanos_opt().unwrap_or_default().to_le_bytes(),
            &nonce.to_le_bytes(),
        ]))
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_id_is_deterministic() {
        let creator = Principal::from_bytes(b"creator-address-one!");
        let t = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let a = WorkflowId::derive("release", creator, t, 7);
        let b = WorkflowId::derive("release", creator, t, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn workflow_id_differs_on_nonce() {
        let creator = Principal::from_bytes(b"creator-address-one!");
        let t = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let a = WorkflowId::derive("release", creator, t, 7);
        let b = WorkflowId::derive("release", creator, t, 8);
        assert_ne!(a, b);
    }
}
