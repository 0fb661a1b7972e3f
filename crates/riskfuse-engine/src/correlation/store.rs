//! Symmetric, read-only detector correlation table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use riskfuse_core::errors::LoadError;
use riskfuse_core::types::collections::FxHashMap;

use crate::document;

/// One unordered detector pair with its Pearson coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    #[serde(alias = "detector_a")]
    pub detector_1: String,
    #[serde(alias = "detector_b")]
    pub detector_2: String,
    #[serde(alias = "r")]
    pub pearson_r: f64,
}

impl CorrelationEntry {
    pub fn new(detector_1: impl Into<String>, detector_2: impl Into<String>, pearson_r: f64) -> Self {
        Self {
            detector_1: detector_1.into(),
            detector_2: detector_2.into(),
            pearson_r,
        }
    }

    fn validate(&self, index: usize) -> Result<(), LoadError> {
        if self.detector_1.trim().is_empty() || self.detector_2.trim().is_empty() {
            return Err(LoadError::EmptyDetectorId { index });
        }
        if !self.pearson_r.is_finite() || !(-1.0..=1.0).contains(&self.pearson_r) {
            return Err(LoadError::InvalidCorrelation {
                detector_a: self.detector_1.clone(),
                detector_b: self.detector_2.clone(),
                value: self.pearson_r,
            });
        }
        Ok(())
    }
}

/// A correlation document: either a bare list or `{ "correlations": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationDocument {
    Wrapped { correlations: Vec<CorrelationEntry> },
    List(Vec<CorrelationEntry>),
}

impl CorrelationDocument {
    pub fn into_entries(self) -> Vec<CorrelationEntry> {
        match self {
            Self::Wrapped { correlations } => correlations,
            Self::List(correlations) => correlations,
        }
    }
}

/// Pairwise correlations. `get(a, b) == get(b, a)`; unknown pairs are 0.0.
///
/// `(a, a)` is an ordinary pair: repeated firings of one detector are only
/// discounted against each other when the table says so.
#[derive(Debug, Clone, Default)]
pub struct CorrelationStore {
    pairs: FxHashMap<String, FxHashMap<String, f64>>,
    entry_count: usize,
}

impl CorrelationStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from validated entries. A repeated pair (in either order)
    /// replaces the earlier coefficient.
    pub fn from_entries(
        entries: impl IntoIterator<Item = CorrelationEntry>,
    ) -> Result<Self, LoadError> {
        let mut store = Self::default();
        for (index, entry) in entries.into_iter().enumerate() {
            entry.validate(index)?;
            store.insert(&entry.detector_1, &entry.detector_2, entry.pearson_r);
        }
        Ok(store)
    }

    /// Load a correlation document (JSON, or TOML by extension).
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let doc: CorrelationDocument = document::read_document(path)?;
        let store = Self::from_entries(doc.into_entries())?;
        info!(
            path = %path.display(),
            entries_loaded = store.len(),
            "correlation table loaded"
        );
        Ok(store)
    }

    /// Load from `path` when given, otherwise start empty.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, LoadError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                info!("no correlation table configured, treating all detectors as uncorrelated");
                Ok(Self::empty())
            }
        }
    }

    /// Record `r` for the pair in both orders. A self-pair is stored once.
    fn insert(&mut self, a: &str, b: &str, r: f64) {
        let previous = self
            .pairs
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), r);
        if a != b {
            self.pairs
                .entry(b.to_string())
                .or_default()
                .insert(a.to_string(), r);
        }
        match previous {
            Some(old) => warn!(
                detector_a = a,
                detector_b = b,
                replaced = old,
                pearson_r = r,
                "duplicate correlation pair, keeping the later one"
            ),
            None => self.entry_count += 1,
        }
    }

    /// Pearson r for the unordered pair; 0.0 when unknown.
    pub fn get(&self, a: &str, b: &str) -> f64 {
        self.pairs
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of distinct unordered pairs.
    pub fn len(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}
