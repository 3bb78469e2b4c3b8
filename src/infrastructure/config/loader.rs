use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use super::engine_config::EngineConfig;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (`Serialized`)
    /// 2. `.abathur-workflow/config.yaml` (project config)
    /// 3. `.abathur-workflow/local.yaml` (optional local overrides)
    /// 4. Environment variables (`ABATHUR_WORKFLOW_` prefix, highest priority)
    ///
    /// # Errors
    /// Returns an error if figment extraction or validation fails.
    pub fn load() -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(".abathur-workflow/config.yaml"))
            .merge(Yaml::file(".abathur-workflow/local.yaml"))
            .merge(Env::prefixed("ABATHUR_WORKFLOW_").split("__"))
            .extract()
            .context("failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, skipping project defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be parsed or validation fails.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidLogLevel`] if `logging.level` is unrecognized.
    pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("default config should be valid");
    }

    #[test]
    fn yaml_parsing_overrides_fees() {
        let yaml = r"
fees:
  creation_fee: 100
  execution_fee: 50
logging:
  level: debug
  format: json
";
        let config: EngineConfig = Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(figment::providers::Yaml::string(yaml))
            .extract()
            .expect("yaml should parse");

        assert_eq!(config.fees.creation_fee, 100);
        assert_eq!(config.fees.execution_fee, 50);
        assert_eq!(config.logging.level, "debug");
        ConfigLoader::validate(&config).expect("parsed config should be valid");
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = EngineConfig::default();
        config.logging.level = "invalid".to_string();
        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidLogLevel(_))));
    }
}
