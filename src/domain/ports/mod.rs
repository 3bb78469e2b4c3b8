//! Domain ports (interfaces) to external collaborators.
//!
//! Persisted state (workflow definitions, executions) is core domain data,
//! not an external collaborator, so it lives behind concrete services
//! ([`crate::services::registry`], [`crate::services::execution_store`])
//! rather than a port trait here.

pub mod collaborators;

pub use collaborators::{FeeSink, MailboxTaskRequest, OperatorRegistry, TaskHandle, TaskMailbox};
