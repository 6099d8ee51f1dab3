use idstorm_core::HarnessError;
use thiserror::Error;

/// Failures of the traffic shaping commands
#[derive(Error, Debug)]
pub enum ImpairmentError {
    #[error("Network interface '{0}' does not exist")]
    UnknownInterface(String),

    #[error("No network interface could be detected")]
    NoInterface,

    #[error("Cannot list interfaces in {path}: {source}")]
    Sysfs {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

impl From<ImpairmentError> for HarnessError {
    fn from(err: ImpairmentError) -> Self {
        HarnessError::Impairment(err.to_string())
    }
}
