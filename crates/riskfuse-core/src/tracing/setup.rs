//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize the riskfuse tracing/logging system.
///
/// Reads the `RISKFUSE_LOG` environment variable for per-module log levels,
/// e.g. `RISKFUSE_LOG=riskfuse_engine::batch=debug,riskfuse_core=warn`.
/// `default_directive` is used when the variable is unset or invalid.
///
/// Output goes to stderr; stdout is reserved for JSONL records.
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing(default_directive: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .init();
    });
}

/// Default filter directive for a verbosity count (`-v`, `-vv`).
pub fn directive_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "riskfuse_core=info,riskfuse_engine=info,riskfuse=info",
        1 => "riskfuse_core=debug,riskfuse_engine=debug,riskfuse=debug",
        _ => "riskfuse_core=trace,riskfuse_engine=trace,riskfuse=trace",
    }
}
