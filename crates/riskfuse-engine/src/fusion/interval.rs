//! Beta-distribution interval around a fused posterior, via `statrs`.
//!
//! Pseudo-counts: `alpha = posterior * n + 1`, `beta = (1 - posterior) * n + 1`
//! where `n` is the number of detections. This expresses how much evidence
//! stands behind the posterior; it is not a credible interval derived from
//! the detectors' likelihoods.

use statrs::distribution::{Beta, ContinuousCDF};

use riskfuse_core::constants::CONFIDENCE_LEVEL;

use super::types::ConfidenceInterval;

/// Interval for a posterior backed by `num_detections` observations.
pub fn evidence_interval(posterior: f64, num_detections: usize) -> ConfidenceInterval {
    let p = if posterior.is_finite() {
        posterior.clamp(0.0, 1.0)
    } else {
        0.5
    };
    let n = num_detections as f64;
    let alpha = p * n + 1.0;
    let beta = (1.0 - p) * n + 1.0;
    let (lower, upper) = credible_interval(alpha, beta, CONFIDENCE_LEVEL);
    ConfidenceInterval { lower, upper }
}

/// Equal-tailed interval of a Beta(alpha, beta) distribution holding `level`
/// of the probability mass. Returns (low, high).
///
/// Invalid parameters fall back to (0, 1).
pub fn credible_interval(alpha: f64, beta_param: f64, level: f64) -> (f64, f64) {
    if alpha <= 0.0 || beta_param <= 0.0 || !alpha.is_finite() || !beta_param.is_finite() {
        return (0.0, 1.0);
    }

    // inverse_cdf loses precision on very peaked distributions
    if alpha > 1e6 || beta_param > 1e6 {
        let mean = alpha / (alpha + beta_param);
        let epsilon = 1e-6;
        return ((mean - epsilon).max(0.0), (mean + epsilon).min(1.0));
    }

    let tail = (1.0 - level.clamp(0.0, 1.0)) / 2.0;

    match Beta::new(alpha, beta_param) {
        Ok(dist) => {
            let low = dist.inverse_cdf(tail);
            let high = dist.inverse_cdf(1.0 - tail);

            let low = if low.is_finite() { low.clamp(0.0, 1.0) } else { 0.0 };
            let high = if high.is_finite() { high.clamp(0.0, 1.0) } else { 1.0 };

            (low.min(high), high.max(low))
        }
        Err(_) => (0.0, 1.0),
    }
}
