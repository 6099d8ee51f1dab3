//! Error types for run execution

use thiserror::Error;

/// Errors raised around a run, never from inside a round
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to write report: {0}")]
    ReportIo(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    ReportSerialization(#[from] serde_json::Error),
}

// Convert from config errors
impl From<idstorm_config::ConfigError> for ExecutionError {
    fn from(err: idstorm_config::ConfigError) -> Self {
        Self::ConfigurationError(err.to_string())
    }
}
