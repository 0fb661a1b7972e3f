//! riskfuse-engine: correlation-aware sequential Bayesian evidence fusion.
//!
//! Leaf to root: calibration store, correlation store, fusion core, batch
//! runner. The two stores are loaded once, never mutated afterwards, and are
//! shared read-only (`Arc`) across batch workers.

pub mod batch;
pub mod calibration;
pub mod correlation;
pub mod document;
pub mod fusion;

pub use batch::{BatchOptions, BatchRunner, BatchSummary, EntityRecord};
pub use calibration::{CalibrationStore, DetectorCalibration};
pub use correlation::{CorrelationEntry, CorrelationStore};
pub use fusion::{fuse_detections, Detection, FusionEngine, FusionResult, RiskLevel};
