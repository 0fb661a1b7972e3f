//! Observability for riskfuse.
//! `tracing` crate with `EnvFilter`, logs on stderr.

pub mod setup;

pub use setup::{directive_for_verbosity, init_tracing};
