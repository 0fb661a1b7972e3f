//! Detector calibration records and likelihood-ratio math.

use serde::{Deserialize, Serialize};
use std::fmt;

use riskfuse_core::constants::FPR_FLOOR;
use riskfuse_core::errors::LoadError;

/// Version tag stamped on calibrations synthesized from a detection's confidence.
pub const HEURISTIC_VERSION: &str = "confidence-heuristic";

/// Sensitivity/specificity parameters for one detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorCalibration {
    pub detector_id: String,
    #[serde(default, deserialize_with = "version_string")]
    pub version: String,
    /// Sensitivity, P(fires | positive).
    pub true_positive_rate: f64,
    /// 1 - specificity, P(fires | negative).
    pub false_positive_rate: f64,
    /// Advisory 0-100 score. Not used by fusion.
    #[serde(default)]
    pub base_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DetectorCalibration {
    pub fn new(
        detector_id: impl Into<String>,
        true_positive_rate: f64,
        false_positive_rate: f64,
    ) -> Self {
        Self {
            detector_id: detector_id.into(),
            version: String::new(),
            true_positive_rate,
            false_positive_rate,
            base_confidence: 0.0,
            notes: None,
        }
    }

    /// Synthesize a calibration for an unknown detector from one detection's
    /// own `confidence_score` (0-100).
    ///
    /// `p = c / 100`, `TPR = 0.5 + 0.45 p` (0.5..0.95), `FPR = 0.1 (1 - p)`
    /// (0..0.1). Once `FPR` is floored the ratio is bounded by 950.
    pub fn from_confidence(detector_id: impl Into<String>, confidence_score: f64) -> Self {
        let p = if confidence_score.is_finite() {
            (confidence_score / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            detector_id: detector_id.into(),
            version: HEURISTIC_VERSION.to_string(),
            true_positive_rate: 0.5 + p * 0.45,
            false_positive_rate: 0.1 * (1.0 - p),
            base_confidence: p * 100.0,
            notes: None,
        }
    }

    /// `LR+ = TPR / FPR`, with `FPR` floored at 0.001 so the ratio stays finite.
    pub fn likelihood_ratio_positive(&self) -> f64 {
        self.true_positive_rate / self.false_positive_rate.max(FPR_FLOOR)
    }

    /// `LR- = (1 - TPR) / (1 - FPR)`, with `1 - FPR` floored at 0.001.
    pub fn likelihood_ratio_negative(&self) -> f64 {
        (1.0 - self.true_positive_rate) / (1.0 - self.false_positive_rate).max(FPR_FLOOR)
    }

    /// Check the rate invariants. `index` is the entry's position in its document.
    pub fn validate(&self, index: usize) -> Result<(), LoadError> {
        if self.detector_id.trim().is_empty() {
            return Err(LoadError::EmptyDetectorId { index });
        }
        for (field, value) in [
            ("true_positive_rate", self.true_positive_rate),
            ("false_positive_rate", self.false_positive_rate),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(LoadError::InvalidRate {
                    detector_id: self.detector_id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Accept `"version": "2.1"` as well as `"version": 2`.
fn version_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Integer(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

/// A calibration document: either a bare list or `{ "detectors": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalibrationDocument {
    Wrapped { detectors: Vec<DetectorCalibration> },
    List(Vec<DetectorCalibration>),
}

impl CalibrationDocument {
    pub fn into_entries(self) -> Vec<DetectorCalibration> {
        match self {
            Self::Wrapped { detectors } => detectors,
            Self::List(detectors) => detectors,
        }
    }
}

/// Where a likelihood ratio came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikelihoodSource {
    /// A calibration entry for the detector.
    Calibrated,
    /// Synthesized from the detection's confidence score.
    DefaultHeuristic,
}

impl LikelihoodSource {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Calibrated => "calibrated",
            Self::DefaultHeuristic => "default_heuristic",
        }
    }
}

impl fmt::Display for LikelihoodSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The likelihood ratios resolved for one detection. Fusion consumes only
/// `likelihood_ratio` (LR+); LR- is carried for the audit log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLikelihood {
    pub likelihood_ratio: f64,
    pub likelihood_ratio_negative: f64,
    pub source: LikelihoodSource,
}

impl ResolvedLikelihood {
    pub fn from_calibration(calibration: &DetectorCalibration, source: LikelihoodSource) -> Self {
        Self {
            likelihood_ratio: calibration.likelihood_ratio_positive(),
            likelihood_ratio_negative: calibration.likelihood_ratio_negative(),
            source,
        }
    }
}
