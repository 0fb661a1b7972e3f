//! Shared constants for the riskfuse engine.

/// riskfuse version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default prior probability P(entity-is-positive) before any evidence.
pub const DEFAULT_PRIOR_PROBABILITY: f64 = 0.05;

/// Floor applied to a false positive rate (and to `1 - FPR`) before division.
pub const FPR_FLOOR: f64 = 0.001;

/// Posteriors are clamped to `(EPSILON, 1 - EPSILON)` before odds conversion.
pub const POSTERIOR_EPSILON: f64 = 1e-9;

/// Probability mass covered by the reported confidence interval.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Default batch parallelism (0 = rayon auto-detect).
pub const DEFAULT_PARALLELISM: usize = 0;

/// Default number of input lines fused per parallel chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Field name under which the fusion result is attached to each output record.
pub const AGGREGATE_RISK_FIELD: &str = "aggregate_risk";

/// Default project config file name.
pub const CONFIG_FILE_NAME: &str = "riskfuse.toml";

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "RISKFUSE_LOG";
