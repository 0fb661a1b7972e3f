//! Sequential Bayesian update in odds space with correlation discounting.
//!
//! 1. Order detections by `confidence_score`, highest first (stable).
//! 2. Discount each against the earlier detectors it correlates with.
//! 3. For each detection: `LR' = 1 + (LR+ - 1) * discount`,
//!    `odds' = odds * LR'`, `posterior' = odds' / (1 + odds')`.
//! 4. Beta interval from the final posterior and the detection count.
//! 5. Map the posterior onto a risk level.

use std::sync::Arc;

use tracing::{debug, trace};

use riskfuse_core::constants::POSTERIOR_EPSILON;
use riskfuse_core::errors::ConfigError;

use super::discount::correlation_discounts;
use super::interval::evidence_interval;
use super::types::{Detection, FusionMethod, FusionResult, FusionStep, RiskLevel};
use crate::calibration::CalibrationStore;
use crate::correlation::CorrelationStore;

/// Fuse one entity's detections into a calibrated posterior.
///
/// Pure: the result depends only on the arguments, so the same input always
/// yields a bit-identical result. `prior` is used verbatim when there are no
/// detections and clamped to `(ε, 1 - ε)` before any odds conversion.
pub fn fuse_detections(
    prior: f64,
    detections: &[Detection],
    calibration: &CalibrationStore,
    correlations: &CorrelationStore,
) -> FusionResult {
    if detections.is_empty() {
        return prior_only(prior);
    }

    let mut ordered: Vec<(&Detection, f64)> = detections
        .iter()
        .map(|d| (d, d.normalized_confidence()))
        .collect();
    // slice::sort_by is stable: ties keep input order
    ordered.sort_by(|a, b| sort_key(b.0).total_cmp(&sort_key(a.0)));

    let ids: Vec<&str> = ordered.iter().map(|(d, _)| d.detector_id.as_str()).collect();
    let discounts = correlation_discounts(&ids, correlations);

    let mut posterior = prior;
    let mut fusion_log = Vec::with_capacity(ordered.len());
    let mut effective_detections = 0.0;

    for ((detection, confidence), discount) in ordered.iter().zip(&discounts) {
        let resolved = calibration.resolve(&detection.detector_id, *confidence);
        let lr = resolved.likelihood_ratio;
        let discounted_lr = 1.0 + (lr - 1.0) * discount.discount;

        let entering = posterior;
        let next = if discounted_lr == 1.0 {
            entering
        } else {
            bayes_update(entering, discounted_lr)
        };

        trace!(
            detector_id = %detection.detector_id,
            prior = entering,
            likelihood_ratio = lr,
            discount = discount.discount,
            posterior = next,
            "fusion step"
        );

        fusion_log.push(FusionStep {
            detector_id: detection.detector_id.clone(),
            confidence_score: detection.confidence_score,
            prior: entering,
            likelihood_ratio: lr,
            likelihood_ratio_negative: resolved.likelihood_ratio_negative,
            likelihood_source: resolved.source,
            discount: discount.discount,
            correlated_with: discount.correlated_with.map(str::to_string),
            discounted_likelihood_ratio: discounted_lr,
            posterior: next,
        });

        effective_detections += discount.discount;
        posterior = next;
    }

    let num_detections = ordered.len();
    let result = FusionResult {
        prior_probability: prior,
        posterior_probability: posterior,
        risk_score: risk_score(posterior),
        risk_level: RiskLevel::from_posterior(posterior),
        confidence_interval_95: evidence_interval(posterior, num_detections),
        num_detections,
        detectors: ids.iter().map(|id| id.to_string()).collect(),
        fusion_log,
        effective_detections,
        fusion_method: FusionMethod::BayesianCorrelated,
    };

    debug!(
        num_detections,
        effective_detections,
        posterior = result.posterior_probability,
        risk_level = %result.risk_level,
        "detections fused"
    );

    result
}

/// One odds-space update. Never returns NaN; the direction of the move
/// always agrees with `likelihood_ratio` relative to 1.
fn bayes_update(posterior: f64, likelihood_ratio: f64) -> f64 {
    let p = if posterior.is_finite() {
        posterior.clamp(POSTERIOR_EPSILON, 1.0 - POSTERIOR_EPSILON)
    } else {
        0.5
    };
    let lr = if likelihood_ratio.is_finite() {
        likelihood_ratio.max(0.0)
    } else {
        1.0
    };

    let odds = p / (1.0 - p);
    let updated_odds = odds * lr;
    let updated = (updated_odds / (1.0 + updated_odds)).clamp(0.0, 1.0);

    // rounding in the odds round-trip must not reverse the evidence
    if lr >= 1.0 {
        updated.max(posterior)
    } else {
        updated.min(posterior)
    }
}

/// Raw confidence for ordering; non-finite scores sort last.
fn sort_key(detection: &Detection) -> f64 {
    if detection.confidence_score.is_finite() {
        detection.confidence_score
    } else {
        f64::NEG_INFINITY
    }
}

fn risk_score(posterior: f64) -> u8 {
    (posterior.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn prior_only(prior: f64) -> FusionResult {
    FusionResult {
        prior_probability: prior,
        posterior_probability: prior,
        risk_score: risk_score(prior),
        risk_level: RiskLevel::from_posterior(prior),
        confidence_interval_95: evidence_interval(prior, 0),
        num_detections: 0,
        detectors: Vec::new(),
        fusion_log: Vec::new(),
        effective_detections: 0.0,
        fusion_method: FusionMethod::PriorOnly,
    }
}

/// Fusion with its prior and both read-only tables bound once.
///
/// Cloning is cheap (two `Arc`s), so each batch worker can hold its own handle.
#[derive(Debug, Clone)]
pub struct FusionEngine {
    prior: f64,
    calibration: Arc<CalibrationStore>,
    correlations: Arc<CorrelationStore>,
}

impl FusionEngine {
    /// Create an engine. `prior` must lie strictly between 0 and 1.
    pub fn new(
        prior: f64,
        calibration: Arc<CalibrationStore>,
        correlations: Arc<CorrelationStore>,
    ) -> Result<Self, ConfigError> {
        if !(prior > 0.0 && prior < 1.0) {
            return Err(ConfigError::ValidationFailed {
                field: "fusion.prior_probability".to_string(),
                message: format!("{prior} is not strictly between 0.0 and 1.0"),
            });
        }
        Ok(Self {
            prior,
            calibration,
            correlations,
        })
    }

    /// Engine with empty tables: every detector uses the heuristic and
    /// every pair is uncorrelated.
    pub fn with_prior(prior: f64) -> Result<Self, ConfigError> {
        Self::new(
            prior,
            Arc::new(CalibrationStore::empty()),
            Arc::new(CorrelationStore::empty()),
        )
    }

    pub fn prior(&self) -> f64 {
        self.prior
    }

    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    pub fn correlations(&self) -> &CorrelationStore {
        &self.correlations
    }

    /// Fuse one entity's detections.
    pub fn fuse(&self, detections: &[Detection]) -> FusionResult {
        fuse_detections(self.prior, detections, &self.calibration, &self.correlations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{DetectorCalibration, LikelihoodSource};
    use crate::correlation::CorrelationEntry;

    fn correlations(entries: &[(&str, &str, f64)]) -> CorrelationStore {
        CorrelationStore::from_entries(
            entries.iter().map(|&(a, b, r)| CorrelationEntry::new(a, b, r)),
        )
        .unwrap()
    }

    #[test]
    fn empty_detections_return_the_prior() {
        let result = fuse_detections(0.05, &[], &CalibrationStore::empty(), &CorrelationStore::empty());
        assert_eq!(result.posterior_probability, 0.05);
        assert_eq!(result.risk_level, RiskLevel::Clean);
        assert_eq!(result.risk_score, 5);
        assert!(result.fusion_log.is_empty());
        assert_eq!(result.fusion_method, FusionMethod::PriorOnly);
        assert_eq!(result.effective_detections, 0.0);
    }

    #[test]
    fn single_uncalibrated_detection() {
        let result = fuse_detections(
            0.05,
            &[Detection::new("x", 90.0)],
            &CalibrationStore::empty(),
            &CorrelationStore::empty(),
        );
        assert!((result.posterior_probability - 0.8265).abs() < 1e-3);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.risk_score, 83);
        assert_eq!(result.fusion_log.len(), 1);

        let step = &result.fusion_log[0];
        assert_eq!(step.prior, 0.05);
        assert_eq!(step.discount, 1.0);
        assert_eq!(step.likelihood_source, LikelihoodSource::DefaultHeuristic);
        assert!((step.likelihood_ratio - 90.5).abs() < 1e-9);
        // (1 - 0.905) / (1 - 0.01)
        assert!((step.likelihood_ratio_negative - 0.095 / 0.99).abs() < 1e-9);
        assert_eq!(step.discounted_likelihood_ratio, step.likelihood_ratio);
    }

    #[test]
    fn sorted_by_confidence_with_stable_ties() {
        let detections = [
            Detection::new("low", 20.0),
            Detection::new("tie_a", 70.0),
            Detection::new("high", 95.0),
            Detection::new("tie_b", 70.0),
        ];
        let result = fuse_detections(
            0.05,
            &detections,
            &CalibrationStore::empty(),
            &CorrelationStore::empty(),
        );
        assert_eq!(result.detectors, ["high", "tie_a", "tie_b", "low"]);
    }

    #[test]
    fn correlated_second_detector_is_discounted() {
        let corr = correlations(&[("x", "y", 0.9)]);
        let cal = CalibrationStore::empty();
        let detections = [Detection::new("x", 90.0), Detection::new("y", 90.0)];

        let correlated = fuse_detections(0.05, &detections, &cal, &corr);
        let independent = fuse_detections(0.05, &detections, &cal, &CorrelationStore::empty());

        let step = &correlated.fusion_log[1];
        assert!((step.discount - 0.1).abs() < 1e-12);
        assert!((step.discounted_likelihood_ratio - (1.0 + 89.5 * 0.1)).abs() < 1e-6);
        assert_eq!(step.correlated_with.as_deref(), Some("x"));
        assert!(correlated.posterior_probability < independent.posterior_probability);
        assert!(correlated.posterior_probability > correlated.fusion_log[0].posterior);
        assert!((correlated.effective_detections - 1.1).abs() < 1e-12);
    }

    #[test]
    fn perfectly_correlated_detector_changes_nothing() {
        let corr = correlations(&[("x", "y", 1.0)]);
        let result = fuse_detections(
            0.05,
            &[Detection::new("x", 80.0), Detection::new("y", 80.0)],
            &CalibrationStore::empty(),
            &corr,
        );
        let second = &result.fusion_log[1];
        assert_eq!(second.discount, 0.0);
        assert_eq!(second.discounted_likelihood_ratio, 1.0);
        assert_eq!(second.posterior, second.prior);
        assert_eq!(result.effective_detections, 1.0);
    }

    #[test]
    fn same_detector_twice_counts_twice_without_a_self_pair() {
        let detections = [Detection::new("x", 90.0), Detection::new("x", 90.0)];
        let result = fuse_detections(0.05, &detections, &CalibrationStore::empty(), &CorrelationStore::empty());

        let second = &result.fusion_log[1];
        assert_eq!(second.discount, 1.0);
        assert!(second.correlated_with.is_none());
        assert_eq!(result.effective_detections, 2.0);
        // odds 0.05/0.95 * 90.5^2
        assert!((result.posterior_probability - 0.99769).abs() < 1e-4);
    }

    #[test]
    fn same_detector_twice_follows_a_configured_self_pair() {
        let corr = correlations(&[("x", "x", 1.0)]);
        let detections = [Detection::new("x", 90.0), Detection::new("x", 90.0)];
        let result = fuse_detections(0.05, &detections, &CalibrationStore::empty(), &corr);
        assert_eq!(result.fusion_log[1].discount, 0.0);
        assert_eq!(result.effective_detections, 1.0);
    }

    #[test]
    fn log_keeps_the_raw_confidence_and_orders_by_it() {
        let detections = [Detection::new("capped", 100.0), Detection::new("over", 140.0)];
        let result = fuse_detections(0.05, &detections, &CalibrationStore::empty(), &CorrelationStore::empty());

        assert_eq!(result.detectors, ["over", "capped"]);
        assert_eq!(result.fusion_log[0].confidence_score, 140.0);
        assert_eq!(result.fusion_log[1].confidence_score, 100.0);
        // the heuristic still sees the clamped score
        assert_eq!(result.fusion_log[0].likelihood_ratio, result.fusion_log[1].likelihood_ratio);
    }

    #[test]
    fn calibrated_ratio_below_one_lowers_the_posterior() {
        let cal = CalibrationStore::from_entries([DetectorCalibration::new("weak", 0.2, 0.4)]).unwrap();
        let result = fuse_detections(0.3, &[Detection::new("weak", 50.0)], &cal, &CorrelationStore::empty());
        assert_eq!(result.fusion_log[0].likelihood_source, LikelihoodSource::Calibrated);
        assert!(result.posterior_probability < 0.3);
    }

    #[test]
    fn zero_tpr_never_produces_nan() {
        let cal = CalibrationStore::from_entries([
            DetectorCalibration::new("never", 0.0, 0.5),
            DetectorCalibration::new("always", 1.0, 0.0),
        ])
        .unwrap();
        let result = fuse_detections(
            0.05,
            &[Detection::new("never", 99.0), Detection::new("always", 10.0)],
            &cal,
            &CorrelationStore::empty(),
        );
        assert!(result.posterior_probability.is_finite());
        assert!((0.0..=1.0).contains(&result.posterior_probability));
        assert!(result.fusion_log[1].posterior > result.fusion_log[1].prior);
    }

    #[test]
    fn engine_rejects_degenerate_priors() {
        assert!(FusionEngine::with_prior(0.0).is_err());
        assert!(FusionEngine::with_prior(1.0).is_err());
        assert!(FusionEngine::with_prior(f64::NAN).is_err());
        assert_eq!(FusionEngine::with_prior(0.05).unwrap().prior(), 0.05);
    }

    #[test]
    fn engine_delegates_to_free_function() {
        let engine = FusionEngine::with_prior(0.05).unwrap();
        let detections = [Detection::new("x", 60.0), Detection::new("y", 40.0)];
        assert_eq!(
            engine.fuse(&detections),
            fuse_detections(0.05, &detections, engine.calibration(), engine.correlations())
        );
    }
}
