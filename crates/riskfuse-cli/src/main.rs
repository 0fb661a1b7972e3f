//! riskfuse: fuse per-entity detector signals into calibrated risk scores.
//!
//! Reads JSONL entity records (stdin or a file), attaches an `aggregate_risk`
//! block to each, and writes JSONL (stdout or a file). With
//! `--init-calibration` it writes a starter calibration table instead.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use riskfuse_core::config::{CliOverrides, RiskfuseConfig};
use riskfuse_core::errors::{BatchError, ConfigError, RiskfuseErrorCode};
use riskfuse_core::tracing::{directive_for_verbosity, init_tracing};
use riskfuse_engine::calibration::write_default_calibration;
use riskfuse_engine::{BatchOptions, BatchRunner, CalibrationStore, CorrelationStore, FusionEngine};

/// Command-line arguments for riskfuse
#[derive(Parser, Debug)]
#[command(name = "riskfuse")]
#[command(about = "Correlation-aware Bayesian fusion of detector signals")]
#[command(version)]
struct Args {
    /// Input JSONL file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output JSONL file, or `-` for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Detector calibration document (JSON, or TOML by extension)
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Detector correlation document (JSON, or TOML by extension)
    #[arg(long)]
    correlations: Option<PathBuf>,

    /// Prior probability that an entity is positive
    #[arg(long)]
    prior: Option<f64>,

    /// Config file (defaults to ./riskfuse.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Records fused per parallel chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Attach the per-detector fusion log to every output record
    #[arg(long)]
    with_log: bool,

    /// Write a starter calibration table to the calibration path and exit
    #[arg(long)]
    init_calibration: bool,

    /// Print the resolved configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            prior_probability: self.prior,
            parallelism: self.threads,
            chunk_size: self.chunk_size,
            include_fusion_log: self.with_log.then_some(true),
            calibration_path: self.calibration.clone(),
            correlation_path: self.correlations.clone(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(directive_for_verbosity(args.verbose));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("riskfuse: {}", e.tagged_string());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), BatchError> {
    let cwd = std::env::current_dir()?;
    let config = RiskfuseConfig::load(&cwd, args.config.as_deref(), Some(&args.overrides()))?;

    if args.print_config {
        let rendered = config.to_toml()?;
        io::stdout().write_all(rendered.as_bytes())?;
        return Ok(());
    }

    if args.init_calibration {
        let path = config
            .sources
            .calibration_path
            .as_deref()
            .ok_or_else(|| ConfigError::ValidationFailed {
                field: "sources.calibration_path".to_string(),
                message: "--init-calibration needs --calibration <PATH>".to_string(),
            })?;
        let count = write_default_calibration(path)?;
        info!(path = %path.display(), entries = count, "starter calibration written");
        return Ok(());
    }

    // Startup: the only fatal failures are here.
    let calibration = CalibrationStore::load_optional(config.sources.calibration_path.as_deref())?;
    let correlations =
        CorrelationStore::load_optional(config.sources.correlation_path.as_deref())?;
    let engine = FusionEngine::new(
        config.fusion.effective_prior_probability(),
        Arc::new(calibration),
        Arc::new(correlations),
    )?;
    let runner = BatchRunner::new(engine, BatchOptions::from_config(&config.batch));

    info!(
        prior = runner.engine().prior(),
        calibrated_detectors = runner.engine().calibration().len(),
        correlated_pairs = runner.engine().correlations().len(),
        input = %args.input,
        output = %args.output,
        "starting batch"
    );

    let summary = runner.run(open_input(&args.input)?, open_output(&args.output)?)?;

    eprintln!(
        "riskfuse: processed {} records, skipped {} ({} lines read)",
        summary.processed, summary.skipped, summary.total_lines
    );
    Ok(())
}

fn open_input(path: &str) -> io::Result<Box<dyn io::BufRead>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(io::stdin().lock())))
    } else {
        Ok(Box::new(BufReader::new(File::open(Path::new(path))?)))
    }
}

fn open_output(path: &str) -> io::Result<Box<dyn Write>> {
    if path == "-" {
        Ok(Box::new(BufWriter::new(io::stdout().lock())))
    } else {
        Ok(Box::new(BufWriter::new(File::create(Path::new(path))?)))
    }
}
