//! Logging setup for idstorm
//!
//! Log output always goes to stderr so stdout stays free for the run report.

pub mod init;

pub use init::{filter_directive, init_logging_from_config, init_simple_tracing, LoggingGuard};
