//! Correlation store: symmetric pairwise Pearson correlation between detectors.

pub mod store;

pub use store::{CorrelationDocument, CorrelationEntry, CorrelationStore};
