//! Locations of the calibration and correlation documents.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Paths to the two read-only tables. Absent paths mean an empty table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SourcesConfig {
    pub calibration_path: Option<PathBuf>,
    pub correlation_path: Option<PathBuf>,
}
