//! Configuration system for riskfuse.
//! TOML-based, layered resolution: CLI > env > project file > defaults.

pub mod batch_config;
pub mod fusion_config;
pub mod riskfuse_config;
pub mod sources_config;

pub use batch_config::BatchConfig;
pub use fusion_config::FusionConfig;
pub use riskfuse_config::{CliOverrides, RiskfuseConfig};
pub use sources_config::SourcesConfig;
