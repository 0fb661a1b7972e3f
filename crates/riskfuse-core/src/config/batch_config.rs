//! Batch runner configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_PARALLELISM};

/// Configuration for the streaming batch runner.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads. 0 = rayon auto-detect. Default: 0.
    pub parallelism: Option<usize>,
    /// Input lines fused per parallel chunk. Default: 256.
    pub chunk_size: Option<usize>,
    /// Attach the per-step fusion log to every output record. Default: false.
    pub include_fusion_log: Option<bool>,
}

impl BatchConfig {
    /// Returns the effective parallelism, defaulting to 0 (auto).
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.unwrap_or(DEFAULT_PARALLELISM)
    }

    /// Returns the effective chunk size, defaulting to 256.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    /// Returns whether fusion logs are attached, defaulting to false.
    pub fn effective_include_fusion_log(&self) -> bool {
        self.include_fusion_log.unwrap_or(false)
    }
}
