//! Execution store — owns live [`WorkflowExecution`] state, one lock per
//! execution id.
//!
//! Grounded on the concurrency model described for this engine: workflow
//! definitions are immutable and safe to share, but executions are mutated
//! by schedulers, submission handlers, and timeout checks that must observe
//! a consistent view. A single lock over the whole map would serialize
//! unrelated executions; a per-execution `RwLock` behind an `Arc` lets
//! independent executions proceed concurrently while still serializing all
//! transitions on one execution.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::execution::WorkflowExecution;
use crate::domain::models::ids::ExecutionId;

#[derive(Default)]
pub struct ExecutionStore {
    executions: RwLock<HashMap<ExecutionId, Arc<RwLock<WorkflowExecution>>>>,
}

impl ExecutionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, execution: WorkflowExecution) {
        let id = execution.execution_id;
        self.executions
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(execution)));
    }

    /// Fetch the lock guarding one execution's state, to be locked by the
    /// caller for the duration of a single transition.
    pub async fn get_handle(
        &self,
        id: ExecutionId,
    ) -> DomainResult<Arc<RwLock<WorkflowExecution>>> {
        self.executions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DomainError::ExecutionNotFound(id))
    }

    /// Read-only snapshot, for view queries that don't need to hold the lock.
    pub async fn snapshot(&self, id: ExecutionId) -> DomainResult<WorkflowExecution> {
        let handle = self.get_handle(id).await?;
        let guard = handle.read().await;
        Ok(guard.clone())
    }
}
