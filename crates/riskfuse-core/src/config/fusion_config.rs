//! Fusion configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PRIOR_PROBABILITY;

/// Configuration for the fusion core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FusionConfig {
    /// Process-wide prior P(entity-is-positive). Default: 0.05.
    pub prior_probability: Option<f64>,
}

impl FusionConfig {
    /// Returns the effective prior probability, defaulting to 0.05.
    pub fn effective_prior_probability(&self) -> f64 {
        self.prior_probability.unwrap_or(DEFAULT_PRIOR_PROBABILITY)
    }
}
