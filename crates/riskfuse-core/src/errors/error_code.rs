//! RiskfuseErrorCode trait for stable, machine-readable error codes.

/// Every error enum implements this so callers (the CLI, log pipelines)
/// can branch on a stable code instead of the display string.
pub trait RiskfuseErrorCode {
    /// Returns the error code string (e.g., "LOAD_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn tagged_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const LOAD_ERROR: &str = "LOAD_ERROR";
pub const RECORD_ERROR: &str = "RECORD_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const THREAD_POOL_ERROR: &str = "THREAD_POOL_ERROR";
