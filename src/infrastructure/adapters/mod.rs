//! Reference in-memory adapters for the engine's external collaborators.

pub mod fee_sink;
pub mod mailbox;
pub mod operator_registry;

pub use fee_sink::InMemoryFeeSink;
pub use mailbox::InMemoryTaskMailbox;
pub use operator_registry::InMemoryOperatorRegistry;
