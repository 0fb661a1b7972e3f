//! Per-record errors. Recoverable: the batch logs and skips the record.

use super::error_code::{self, RiskfuseErrorCode};

/// Errors tied to a single input line.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Line {line}: input is not valid UTF-8")]
    InvalidUtf8 { line: usize },

    #[error("Line {line}: malformed record: {message}")]
    Malformed { line: usize, message: String },

    #[error("Line {line}: failed to encode output record: {message}")]
    Encode { line: usize, message: String },
}

impl RecordError {
    /// 1-based input line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            Self::InvalidUtf8 { line }
            | Self::Malformed { line, .. }
            | Self::Encode { line, .. } => *line,
        }
    }
}

impl RiskfuseErrorCode for RecordError {
    fn error_code(&self) -> &'static str {
        error_code::RECORD_ERROR
    }
}
