//! Calibration and correlation document errors.
//!
//! All of these are fatal: fusion cannot start from a broken table.

use super::error_code::{self, RiskfuseErrorCode};

/// Errors raised while loading or writing a calibration/correlation document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Document not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("Detector entry #{index} has an empty detector_id")]
    EmptyDetectorId { index: usize },

    #[error("Detector {detector_id}: {field} = {value} is outside [0, 1]")]
    InvalidRate {
        detector_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("Correlation ({detector_a}, {detector_b}): pearson_r = {value} is outside [-1, 1]")]
    InvalidCorrelation {
        detector_a: String,
        detector_b: String,
        value: f64,
    },
}

impl RiskfuseErrorCode for LoadError {
    fn error_code(&self) -> &'static str {
        error_code::LOAD_ERROR
    }
}
