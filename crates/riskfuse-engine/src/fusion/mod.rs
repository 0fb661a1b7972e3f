//! Fusion core: correlation-discounted sequential Bayesian updating.
//!
//! Every risk score riskfuse emits flows through `fuse_detections`.

pub mod discount;
pub mod engine;
pub mod interval;
pub mod types;

pub use discount::{correlation_discounts, CorrelationDiscount};
pub use engine::{fuse_detections, FusionEngine};
pub use interval::{credible_interval, evidence_interval};
pub use types::{
    ConfidenceInterval, Detection, FusionMethod, FusionResult, FusionStep, RiskLevel,
};
