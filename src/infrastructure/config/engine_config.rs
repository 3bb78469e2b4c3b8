//! Top-level configuration for the workflow engine.

use serde::{Deserialize, Serialize};

use crate::infrastructure::logging::LogConfig;

/// Fee schedule charged by [`crate::services::registry::WorkflowRegistry`]
/// and [`crate::services::scheduler`] and forwarded to the fee sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeConfig {
    pub creation_fee: u128,
    pub execution_fee: u128,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            creation_fee: 0,
            execution_fee: 0,
        }
    }
}

/// Reference-adapter tuning; production deployments would source these
/// from the real collaborators instead.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Operator count the in-memory registry reports for unconfigured sets.
    pub default_operator_count: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_operator_count: crate::services::phase_executors::DEFAULT_OPERATOR_COUNT_FALLBACK,
        }
    }
}

/// Root configuration, loaded via [`super::loader::ConfigLoader`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub fees: FeeConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LogConfig,
}
