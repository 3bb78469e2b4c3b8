//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation
//! - Type-safe config structs

pub mod engine_config;
pub mod loader;

pub use engine_config::{EngineConfig, FeeConfig, LimitsConfig};
pub use loader::{ConfigError, ConfigLoader};
