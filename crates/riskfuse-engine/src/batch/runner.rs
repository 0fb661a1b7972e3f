//! Streaming batch runner.
//!
//! Input is read in chunks of `chunk_size` lines; each chunk is fused in
//! parallel on a rayon pool and written back in input order. Memory use is
//! bounded by the chunk size, not the input size.

use std::io::{BufRead, Write};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, info_span, warn};

use riskfuse_core::config::BatchConfig;
use riskfuse_core::errors::{BatchError, RecordError, RiskfuseErrorCode};

use super::reader::{LineReader, RawLine};
use super::record::{AggregateRisk, EnrichedRecord, EntityRecord};
use crate::fusion::{FusionEngine, FusionResult};

/// Skipped-record errors kept on the summary; the rest are only counted.
pub const MAX_RETAINED_ERRORS: usize = 100;

/// Runner knobs, usually taken from `[batch]` in the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker threads; 0 lets rayon decide.
    pub parallelism: usize,
    pub chunk_size: usize,
    pub include_fusion_log: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&BatchConfig::default())
    }
}

impl BatchOptions {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            parallelism: config.effective_parallelism(),
            chunk_size: config.effective_chunk_size().max(1),
            include_fusion_log: config.effective_include_fusion_log(),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Lines read, blank ones included.
    pub total_lines: usize,
    pub processed: usize,
    pub skipped: usize,
    pub blank: usize,
    pub duration_ms: u128,
    /// The first `MAX_RETAINED_ERRORS` skipped-record errors.
    pub errors: Vec<RecordError>,
}

impl BatchSummary {
    /// True when no record was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }

    fn record_skip(&mut self, error: RecordError) {
        warn!(
            line = error.line(),
            code = error.error_code(),
            error = %error,
            "skipping record"
        );
        self.skipped += 1;
        if self.errors.len() < MAX_RETAINED_ERRORS {
            self.errors.push(error);
        }
    }
}

enum LineOutcome {
    Blank,
    Fused(String),
    Skipped(RecordError),
}

/// Drives the fusion engine over a stream of entity records.
pub struct BatchRunner {
    engine: FusionEngine,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(engine: FusionEngine, options: BatchOptions) -> Self {
        Self { engine, options }
    }

    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Fuse one in-memory record.
    pub fn fuse_record(&self, record: &EntityRecord) -> FusionResult {
        self.engine.fuse(&record.detections)
    }

    /// Lazily fuse in-memory records, preserving order.
    pub fn fuse_records<'a, I>(
        &'a self,
        records: I,
    ) -> impl Iterator<Item = (EntityRecord, FusionResult)> + 'a
    where
        I: IntoIterator<Item = EntityRecord>,
        I::IntoIter: 'a,
    {
        records.into_iter().map(move |record| {
            let result = self.fuse_record(&record);
            (record, result)
        })
    }

    /// Stream JSONL records from `input` to `output`.
    ///
    /// Malformed records are logged and skipped. Read and write failures on
    /// the streams themselves end the run.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: R,
        mut output: W,
    ) -> Result<BatchSummary, BatchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.parallelism)
            .build()
            .map_err(|e| BatchError::ThreadPool {
                message: e.to_string(),
            })?;

        let span = info_span!(
            "riskfuse.batch",
            chunk_size = self.options.chunk_size,
            threads = pool.current_num_threads()
        );
        let _guard = span.enter();

        let start = Instant::now();
        let mut summary = BatchSummary::default();
        let mut reader = LineReader::new(input);
        let mut chunk: Vec<RawLine> = Vec::with_capacity(self.options.chunk_size);

        loop {
            chunk.clear();
            for raw in reader.by_ref().take(self.options.chunk_size) {
                chunk.push(raw?);
            }
            if chunk.is_empty() {
                break;
            }
            summary.total_lines += chunk.len();

            let outcomes: Vec<LineOutcome> =
                pool.install(|| chunk.par_iter().map(|raw| self.process_line(raw)).collect());

            for outcome in outcomes {
                match outcome {
                    LineOutcome::Blank => summary.blank += 1,
                    LineOutcome::Fused(line) => {
                        writeln!(output, "{line}")?;
                        summary.processed += 1;
                    }
                    LineOutcome::Skipped(error) => summary.record_skip(error),
                }
            }
        }

        output.flush()?;

        summary.duration_ms = start.elapsed().as_millis();
        let seconds = start.elapsed().as_secs_f64();
        let records_per_second = if seconds > 0.0 {
            summary.processed as f64 / seconds
        } else {
            0.0
        };
        info!(
            records_processed = summary.processed,
            records_skipped = summary.skipped,
            total_lines = summary.total_lines,
            batch_duration_ms = summary.duration_ms as u64,
            records_per_second,
            "batch complete"
        );

        Ok(summary)
    }

    fn process_line(&self, raw: &RawLine) -> LineOutcome {
        let record = match EntityRecord::parse_line(raw) {
            Ok(Some(record)) => record,
            Ok(None) => return LineOutcome::Blank,
            Err(e) => return LineOutcome::Skipped(e),
        };

        let result = self.fuse_record(&record);
        let enriched = EnrichedRecord {
            record: &record,
            aggregate_risk: AggregateRisk::from_result(result, self.options.include_fusion_log),
        };
        match enriched.to_json_line(raw.number) {
            Ok(line) => LineOutcome::Fused(line),
            Err(e) => LineOutcome::Skipped(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::Detection;

    fn runner(options: BatchOptions) -> BatchRunner {
        BatchRunner::new(FusionEngine::with_prior(0.05).unwrap(), options)
    }

    #[test]
    fn options_follow_config_defaults() {
        let options = BatchOptions::default();
        assert_eq!(options.chunk_size, 256);
        assert_eq!(options.parallelism, 0);
        assert!(!options.include_fusion_log);
    }

    #[test]
    fn skips_bad_lines_and_keeps_going() {
        let input = concat!(
            r#"{"entity_id": "a", "detections": [{"detector_id": "x", "confidence_score": 90}]}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"entity_id": "b"}"#,
            "\n",
        );
        let mut out = Vec::new();
        let summary = runner(BatchOptions::default())
            .run(input.as_bytes(), &mut out)
            .unwrap();

        assert_eq!(summary.total_lines, 4);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.blank, 1);
        assert_eq!(summary.errors[0].line(), 2);
        assert!(!summary.is_clean());

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn retained_errors_are_capped() {
        let input = "garbage\n".repeat(MAX_RETAINED_ERRORS + 5);
        let summary = runner(BatchOptions {
            chunk_size: 7,
            ..BatchOptions::default()
        })
        .run(input.as_bytes(), std::io::sink())
        .unwrap();
        assert_eq!(summary.skipped, MAX_RETAINED_ERRORS + 5);
        assert_eq!(summary.errors.len(), MAX_RETAINED_ERRORS);
    }

    #[test]
    fn fuse_records_is_lazy_and_ordered() {
        let runner = runner(BatchOptions::default());
        let records = vec![
            EntityRecord::new("first", vec![Detection::new("x", 90.0)]),
            EntityRecord::new("second", vec![]),
        ];
        let fused: Vec<_> = runner.fuse_records(records).collect();
        assert_eq!(fused[0].0.entity_id.to_string(), "first");
        assert!(fused[0].1.posterior_probability > 0.8);
        assert_eq!(fused[1].1.posterior_probability, 0.05);
    }
}
