//! Batch run errors. Only startup failures and output I/O end a run.

use super::error_code::{self, RiskfuseErrorCode};
use super::{ConfigError, LoadError};

/// Fatal errors for a batch run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build worker pool: {message}")]
    ThreadPool { message: String },
}

impl RiskfuseErrorCode for BatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Load(e) => e.error_code(),
            Self::Io(_) => error_code::IO_ERROR,
            Self::ThreadPool { .. } => error_code::THREAD_POOL_ERROR,
        }
    }
}
