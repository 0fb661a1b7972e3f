//! Calibration store: per-detector sensitivity/specificity and the
//! likelihood ratios derived from them.

pub mod defaults;
pub mod store;
pub mod types;

pub use defaults::{default_calibration_document, write_default_calibration};
pub use store::CalibrationStore;
pub use types::{
    CalibrationDocument, DetectorCalibration, LikelihoodSource, ResolvedLikelihood,
};
