//! Resilience patterns for idstorm
//!
//! This crate provides the backoff applied between retry rounds and the
//! shutdown coordinator used to cancel a run.

pub mod backoff;
pub mod shutdown;

// Re-export commonly used types
pub use backoff::{BackoffCalculator, BackoffPolicy, BackoffStrategy};
pub use shutdown::{ShutdownCoordinator, ShutdownError, ShutdownListener};
