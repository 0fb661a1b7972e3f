//! Error handling for riskfuse.
//! One error enum per subsystem, `thiserror` only.

pub mod batch_error;
pub mod config_error;
pub mod error_code;
pub mod load_error;
pub mod record_error;

pub use batch_error::BatchError;
pub use config_error::ConfigError;
pub use error_code::RiskfuseErrorCode;
pub use load_error::LoadError;
pub use record_error::RecordError;
