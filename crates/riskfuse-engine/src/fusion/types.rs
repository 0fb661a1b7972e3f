//! Core types for evidence fusion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::calibration::LikelihoodSource;

/// One observed signal for one entity.
///
/// `evidence` and any extra fields are provenance; fusion never reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub detector_id: String,
    /// The detector's own 0-100 confidence in this observation.
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub evidence: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Detection {
    pub fn new(detector_id: impl Into<String>, confidence_score: f64) -> Self {
        Self {
            detector_id: detector_id.into(),
            confidence_score,
            evidence: Value::Null,
            extra: Map::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Value) -> Self {
        self.evidence = evidence;
        self
    }

    /// Confidence clamped to [0, 100]; non-finite values count as 0.
    pub fn normalized_confidence(&self) -> f64 {
        if self.confidence_score.is_finite() {
            self.confidence_score.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Categorical risk bucket. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// posterior < 0.10
    Clean,
    /// 0.10 ≤ posterior < 0.30
    Low,
    /// 0.30 ≤ posterior < 0.60
    Medium,
    /// 0.60 ≤ posterior < 0.85
    High,
    /// posterior ≥ 0.85
    Critical,
}

impl RiskLevel {
    /// Classify a posterior probability.
    pub fn from_posterior(posterior: f64) -> Self {
        if posterior < 0.10 {
            Self::Clean
        } else if posterior < 0.30 {
            Self::Low
        } else if posterior < 0.60 {
            Self::Medium
        } else if posterior < 0.85 {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Clean => "CLEAN",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    /// No detections; the posterior is the prior.
    PriorOnly,
    /// Sequential odds-space update with correlation discounting.
    BayesianCorrelated,
}

impl FusionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PriorOnly => "prior_only",
            Self::BayesianCorrelated => "bayesian_correlated",
        }
    }
}

impl fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 95% interval around the posterior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Audit record for one processed detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionStep {
    pub detector_id: String,
    pub confidence_score: f64,
    /// Posterior entering this step.
    pub prior: f64,
    /// Undiscounted positive likelihood ratio.
    pub likelihood_ratio: f64,
    /// LR- of the same detector; recorded, not applied.
    pub likelihood_ratio_negative: f64,
    pub likelihood_source: LikelihoodSource,
    pub discount: f64,
    /// Earlier detector that set the discount, if any correlation applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlated_with: Option<String>,
    pub discounted_likelihood_ratio: f64,
    /// Posterior leaving this step.
    pub posterior: f64,
}

/// Output of fusing all detections for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub prior_probability: f64,
    pub posterior_probability: f64,
    /// `round(posterior * 100)`.
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub confidence_interval_95: ConfidenceInterval,
    pub num_detections: usize,
    /// Detector ids in processing order.
    pub detectors: Vec<String>,
    pub fusion_log: Vec<FusionStep>,
    /// Sum of discount factors; a soft count of independent evidence.
    pub effective_detections: f64,
    pub fusion_method: FusionMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_boundaries() {
        let cases = [
            (0.0999, RiskLevel::Clean),
            (0.10, RiskLevel::Low),
            (0.2999, RiskLevel::Low),
            (0.30, RiskLevel::Medium),
            (0.5999, RiskLevel::Medium),
            (0.60, RiskLevel::High),
            (0.8499, RiskLevel::High),
            (0.85, RiskLevel::Critical),
        ];
        for (posterior, expected) in cases {
            assert_eq!(RiskLevel::from_posterior(posterior), expected, "posterior {posterior}");
        }
        assert_eq!(RiskLevel::from_posterior(0.0), RiskLevel::Clean);
        assert_eq!(RiskLevel::from_posterior(1.0), RiskLevel::Critical);
    }

    #[test]
    fn risk_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"MEDIUM\"");
        assert_eq!(RiskLevel::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn fusion_method_tags() {
        assert_eq!(serde_json::to_string(&FusionMethod::PriorOnly).unwrap(), "\"prior_only\"");
        assert_eq!(FusionMethod::BayesianCorrelated.to_string(), "bayesian_correlated");
    }

    #[test]
    fn detection_keeps_unknown_fields() {
        let det: Detection = serde_json::from_str(
            r#"{"detector_id": "x", "confidence_score": 75, "evidence": {"url": "u"}, "source": "scrape"}"#,
        )
        .unwrap();
        assert_eq!(det.confidence_score, 75.0);
        assert_eq!(det.extra.get("source"), Some(&Value::from("scrape")));

        let out = serde_json::to_value(&det).unwrap();
        assert_eq!(out["source"], "scrape");
        assert_eq!(out["evidence"]["url"], "u");
    }

    #[test]
    fn detection_requires_confidence() {
        let result: Result<Detection, _> = serde_json::from_str(r#"{"detector_id": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn normalized_confidence_clamps() {
        assert_eq!(Detection::new("x", 140.0).normalized_confidence(), 100.0);
        assert_eq!(Detection::new("x", -3.0).normalized_confidence(), 0.0);
        assert_eq!(Detection::new("x", f64::INFINITY).normalized_confidence(), 0.0);
    }
}
