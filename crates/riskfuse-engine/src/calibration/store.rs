//! Read-only detector calibration table.

use std::path::Path;

use tracing::{info, warn};

use riskfuse_core::errors::LoadError;
use riskfuse_core::types::collections::FxHashMap;

use super::types::{CalibrationDocument, DetectorCalibration, LikelihoodSource, ResolvedLikelihood};
use crate::document;

/// Per-detector calibration parameters, keyed by `detector_id`.
///
/// Built once, never mutated afterwards. A missing entry is a normal state:
/// `resolve` falls back to the confidence-derived heuristic.
#[derive(Debug, Clone, Default)]
pub struct CalibrationStore {
    entries: FxHashMap<String, DetectorCalibration>,
}

impl CalibrationStore {
    /// An empty store; every detector resolves through the heuristic.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from validated entries. A repeated `detector_id` replaces the
    /// earlier entry.
    pub fn from_entries(
        entries: impl IntoIterator<Item = DetectorCalibration>,
    ) -> Result<Self, LoadError> {
        let mut map = FxHashMap::default();
        for (index, entry) in entries.into_iter().enumerate() {
            entry.validate(index)?;
            if let Some(previous) = map.insert(entry.detector_id.clone(), entry) {
                warn!(
                    detector_id = %previous.detector_id,
                    replaced_version = %previous.version,
                    "duplicate calibration entry, keeping the later one"
                );
            }
        }
        Ok(Self { entries: map })
    }

    /// Load a calibration document (JSON, or TOML by extension).
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let doc: CalibrationDocument = document::read_document(path)?;
        let store = Self::from_entries(doc.into_entries())?;
        info!(
            path = %path.display(),
            entries_loaded = store.len(),
            "calibration table loaded"
        );
        Ok(store)
    }

    /// Load from `path` when given, otherwise start empty.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, LoadError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                info!("no calibration table configured, using the default heuristic for every detector");
                Ok(Self::empty())
            }
        }
    }

    /// Calibration for `detector_id`, if one was loaded.
    pub fn get(&self, detector_id: &str) -> Option<&DetectorCalibration> {
        self.entries.get(detector_id)
    }

    /// Likelihood ratios for one detection: the calibrated ones when the
    /// detector is known, otherwise the heuristic built from
    /// `confidence_score`.
    pub fn resolve(&self, detector_id: &str, confidence_score: f64) -> ResolvedLikelihood {
        match self.entries.get(detector_id) {
            Some(cal) => ResolvedLikelihood::from_calibration(cal, LikelihoodSource::Calibrated),
            None => ResolvedLikelihood::from_calibration(
                &DetectorCalibration::from_confidence(detector_id, confidence_score),
                LikelihoodSource::DefaultHeuristic,
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by `detector_id`.
    pub fn entries(&self) -> Vec<&DetectorCalibration> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| a.detector_id.cmp(&b.detector_id));
        entries
    }
}
