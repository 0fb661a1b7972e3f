//! Batch runner: stream JSONL entity records through the fusion core.
//!
//! Per-record failures are logged and skipped; only output I/O and startup
//! errors end a run.

pub mod reader;
pub mod record;
pub mod runner;

pub use reader::{LineReader, RawLine};
pub use record::{AggregateRisk, EnrichedRecord, EntityId, EntityRecord};
pub use runner::{BatchOptions, BatchRunner, BatchSummary};
