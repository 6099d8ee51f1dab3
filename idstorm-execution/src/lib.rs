//! Run execution for idstorm
//!
//! - [`OperationExecutor`]: one classified operation per record id, bounded by a per-call timeout
//! - [`run_round`]: one barrier-synchronized round under a concurrency limit
//! - [`RetryDriver`]: the round loop that drives the pending set to empty
//! - [`summarize`]: final report from the driver's counters
//! - [`with_impairment`]: apply/clear network shaping around a run
//! - [`InMemoryTarget`]: simulated target for dry runs and tests

pub mod driver;
pub mod error;
pub mod executor;
pub mod memory;
pub mod pool;
pub mod report;
pub mod scope;

pub use driver::{DriverConfig, RetryDriver, RoundStats, RunStats, Termination};
pub use error::ExecutionError;
pub use executor::OperationExecutor;
pub use memory::InMemoryTarget;
pub use pool::{run_round, RoundResults};
pub use report::{summarize, RunReport};
pub use scope::{with_impairment, ImpairmentPlan};
