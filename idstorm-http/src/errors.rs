//! HTTP target error types

/// Errors building the HTTP target; request failures are transport errors instead
#[derive(Debug, thiserror::Error)]
pub enum HttpTargetError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<HttpTargetError> for idstorm_core::HarnessError {
    fn from(err: HttpTargetError) -> Self {
        match err {
            HttpTargetError::InvalidUrl(msg) => idstorm_core::HarnessError::Configuration(msg),
            other => idstorm_core::HarnessError::Target(other.to_string()),
        }
    }
}
