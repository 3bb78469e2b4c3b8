//! Abathur Workflow — deterministic multi-phase workflow orchestration engine.
//!
//! Drives executions through a declarative DAG of heterogeneous phases
//! (immediate dispatch, multi-party coordination, continuous monitoring,
//! conditional triggers, and dependency aggregation), enforcing dependency
//! order, per-phase timeouts, authorization, and failure propagation.
//!
//! The engine itself never talks to a transport. It is driven by an
//! embedder (RPC service, on-chain call surface, CLI) through the
//! `WorkflowEngine` facade in [`services::engine`], and it consults three
//! external collaborators through the traits in [`domain::ports`]: a task
//! mailbox, an operator registry, and a fee sink.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use services::engine::WorkflowEngine;
