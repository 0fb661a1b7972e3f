//! Starter calibration table written by `riskfuse --init-calibration`.
//!
//! The rates are conservative placeholders meant to be replaced by values
//! measured offline against labelled entities.

use std::path::Path;

use tracing::info;

use riskfuse_core::errors::LoadError;

use super::types::{CalibrationDocument, DetectorCalibration};
use crate::document;

/// (detector_id, TPR, FPR, base_confidence, notes)
const STARTER_DETECTORS: &[(&str, f64, f64, f64, &str)] = &[
    (
        "watchlist_match",
        0.85,
        0.02,
        85.0,
        "Exact or near-exact name match against a curated watchlist",
    ),
    (
        "registry_anomaly",
        0.70,
        0.05,
        70.0,
        "Inconsistent or missing registration records",
    ),
    (
        "network_link",
        0.60,
        0.08,
        60.0,
        "Shared officers, addresses, or contacts with a flagged entity",
    ),
    (
        "keyword_screen",
        0.55,
        0.15,
        50.0,
        "Adverse keyword hits in public text; high recall, noisy",
    ),
    (
        "manual_flag",
        0.90,
        0.01,
        90.0,
        "Analyst-raised flag",
    ),
];

/// Build the starter calibration document.
pub fn default_calibration_document() -> CalibrationDocument {
    let detectors = STARTER_DETECTORS
        .iter()
        .map(|&(id, tpr, fpr, base, notes)| DetectorCalibration {
            detector_id: id.to_string(),
            version: "1.0".to_string(),
            true_positive_rate: tpr,
            false_positive_rate: fpr,
            base_confidence: base,
            notes: Some(notes.to_string()),
        })
        .collect();
    CalibrationDocument::Wrapped { detectors }
}

/// Write the starter calibration document to `path`. Returns the entry count.
pub fn write_default_calibration(path: &Path) -> Result<usize, LoadError> {
    let doc = default_calibration_document();
    let count = match &doc {
        CalibrationDocument::Wrapped { detectors } | CalibrationDocument::List(detectors) => {
            detectors.len()
        }
    };
    document::write_document(path, &doc)?;
    info!(path = %path.display(), entries = count, "default calibration table written");
    Ok(count)
}
