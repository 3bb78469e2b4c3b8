//! Reference in-memory implementation of [`TaskMailbox`].
//!
//! Stands in for the downstream task dispatcher: records every dispatched
//! task and returns a deterministic handle derived from the dispatch
//! sequence, so reference runs stay reproducible without a real queue.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::ports::collaborators::{MailboxTaskRequest, TaskHandle, TaskMailbox};

#[derive(Default)]
pub struct InMemoryTaskMailbox {
    dispatched: Mutex<Vec<MailboxTaskRequest>>,
    next_handle: AtomicU64,
}

#[async_trait]
impl TaskMailbox for InMemoryTaskMailbox {
    async fn create_task(&self, request: MailboxTaskRequest) -> DomainResult<TaskHandle> {
        let handle_id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.dispatched.lock().await.push(request);
        Ok(TaskHandle(handle_id.to_le_bytes().to_vec()))
    }
}
