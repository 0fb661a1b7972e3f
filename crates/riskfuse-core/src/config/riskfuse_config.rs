//! Top-level riskfuse configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{BatchConfig, FusionConfig, SourcesConfig};
use crate::constants::CONFIG_FILE_NAME;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`RISKFUSE_*`)
/// 3. Project config (`riskfuse.toml`, or an explicit `--config` path)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RiskfuseConfig {
    pub fusion: FusionConfig,
    pub batch: BatchConfig,
    pub sources: SourcesConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub prior_probability: Option<f64>,
    pub parallelism: Option<usize>,
    pub chunk_size: Option<usize>,
    pub include_fusion_log: Option<bool>,
    pub calibration_path: Option<PathBuf>,
    pub correlation_path: Option<PathBuf>,
}

impl RiskfuseConfig {
    /// Load configuration with layered resolution.
    ///
    /// `explicit` names a config file that must exist. Without it,
    /// `root/riskfuse.toml` is used when present and skipped otherwise.
    pub fn load(
        root: &Path,
        explicit: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Self::merge_toml_file(&mut config, path)?;
            }
            None => {
                let project_config_path = root.join(CONFIG_FILE_NAME);
                if project_config_path.exists() {
                    Self::merge_toml_file(&mut config, &project_config_path)?;
                }
            }
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        tracing::debug!(
            prior = config.fusion.effective_prior_probability(),
            chunk_size = config.batch.effective_chunk_size(),
            parallelism = config.batch.effective_parallelism(),
            "configuration resolved"
        );

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &RiskfuseConfig) -> Result<(), ConfigError> {
        if let Some(prior) = config.fusion.prior_probability {
            if !(prior > 0.0 && prior < 1.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "fusion.prior_probability".to_string(),
                    message: "must be strictly between 0.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(chunk_size) = config.batch.chunk_size {
            if chunk_size == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "batch.chunk_size".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut RiskfuseConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: RiskfuseConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins only where it has a value.
    fn merge(base: &mut RiskfuseConfig, other: &RiskfuseConfig) {
        if other.fusion.prior_probability.is_some() {
            base.fusion.prior_probability = other.fusion.prior_probability;
        }

        if other.batch.parallelism.is_some() {
            base.batch.parallelism = other.batch.parallelism;
        }
        if other.batch.chunk_size.is_some() {
            base.batch.chunk_size = other.batch.chunk_size;
        }
        if other.batch.include_fusion_log.is_some() {
            base.batch.include_fusion_log = other.batch.include_fusion_log;
        }

        if other.sources.calibration_path.is_some() {
            base.sources.calibration_path = other.sources.calibration_path.clone();
        }
        if other.sources.correlation_path.is_some() {
            base.sources.correlation_path = other.sources.correlation_path.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Unparseable values are ignored.
    fn apply_env_overrides(config: &mut RiskfuseConfig) {
        if let Ok(val) = std::env::var("RISKFUSE_PRIOR_PROBABILITY") {
            if let Ok(v) = val.parse::<f64>() {
                config.fusion.prior_probability = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RISKFUSE_BATCH_PARALLELISM") {
            if let Ok(v) = val.parse::<usize>() {
                config.batch.parallelism = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RISKFUSE_BATCH_CHUNK_SIZE") {
            if let Ok(v) = val.parse::<usize>() {
                config.batch.chunk_size = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RISKFUSE_CALIBRATION_PATH") {
            if !val.is_empty() {
                config.sources.calibration_path = Some(PathBuf::from(val));
            }
        }
        if let Ok(val) = std::env::var("RISKFUSE_CORRELATION_PATH") {
            if !val.is_empty() {
                config.sources.correlation_path = Some(PathBuf::from(val));
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    pub fn apply_cli_overrides(config: &mut RiskfuseConfig, cli: &CliOverrides) {
        if let Some(v) = cli.prior_probability {
            config.fusion.prior_probability = Some(v);
        }
        if let Some(v) = cli.parallelism {
            config.batch.parallelism = Some(v);
        }
        if let Some(v) = cli.chunk_size {
            config.batch.chunk_size = Some(v);
        }
        if let Some(v) = cli.include_fusion_log {
            config.batch.include_fusion_log = Some(v);
        }
        if let Some(ref v) = cli.calibration_path {
            config.sources.calibration_path = Some(v.clone());
        }
        if let Some(ref v) = cli.correlation_path {
            config.sources.correlation_path = Some(v.clone());
        }
    }

    /// Serialize the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialize>".to_string(),
            message: e.to_string(),
        })
    }
}
