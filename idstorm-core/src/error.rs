//! Core error types for idstorm

use thiserror::Error;

/// Failure to get an application-level answer from the target.
///
/// Every variant is transient from the harness' point of view: the
/// classifier maps all of them to a retryable outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("TLS negotiation failed: {0}")]
    Tls(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Operation aborted: {0}")]
    Aborted(String),

    #[error("{0}")]
    Other(String),
}

/// Errors that stop the harness before or around a run.
///
/// Nothing raised inside a round ends up here; those failures are captured
/// as outcomes.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Invalid or incomplete configuration, detected before any round starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The network shaping command failed
    #[error("Impairment control error: {0}")]
    Impairment(String),

    /// The target could not be prepared
    #[error("Target error: {0}")]
    Target(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for harness-level operations
pub type Result<T> = std::result::Result<T, HarnessError>;
