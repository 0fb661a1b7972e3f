//! Core errors, configuration, tracing, and constants for the riskfuse
//! evidence-fusion engine. No numerical code lives here.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;
