//! Round-based retry driver
//!
//! Seeds the pending set with every id of the universe, hands it to the pool
//! round after round, and keeps only the ids whose outcome was retryable.
//! Counters are touched only here, after each round barrier.

use crate::error::ExecutionError;
use crate::executor::OperationExecutor;
use crate::pool::run_round;
use idstorm_config::{RunConfig, MAX_CONCURRENCY_LIMIT};
use idstorm_core::{OperationKind, Outcome, RecordId};
use idstorm_resilience::{BackoffPolicy, ShutdownListener};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Driver limits, fixed for a run
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub total_records: u64,
    pub concurrency_limit: usize,
    pub backoff: BackoffPolicy,
    pub max_rounds: Option<u32>,
    /// Stop once the pending set has not shrunk for more than this many rounds in a row
    pub stall_rounds: Option<u32>,
    pub max_duration: Option<Duration>,
    pub abort_on_fatal: bool,
}

impl DriverConfig {
    /// Unbounded driver with no pause between rounds
    pub fn new(total_records: u64, concurrency_limit: usize) -> Self {
        Self {
            total_records,
            concurrency_limit,
            backoff: BackoffPolicy::none(),
            max_rounds: None,
            stall_rounds: None,
            max_duration: None,
            abort_on_fatal: false,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    pub fn with_stall_rounds(mut self, stall_rounds: u32) -> Self {
        self.stall_rounds = Some(stall_rounds);
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    pub fn with_abort_on_fatal(mut self, abort_on_fatal: bool) -> Self {
        self.abort_on_fatal = abort_on_fatal;
        self
    }

    fn validate(&self) -> Result<(), ExecutionError> {
        if self.concurrency_limit == 0 {
            return Err(ExecutionError::ConfigurationError(
                "concurrency limit must be greater than 0".to_string(),
            ));
        }
        if self.concurrency_limit > MAX_CONCURRENCY_LIMIT {
            return Err(ExecutionError::ConfigurationError(format!(
                "concurrency limit must be at most {}, got {}",
                MAX_CONCURRENCY_LIMIT, self.concurrency_limit
            )));
        }
        if self.max_rounds == Some(0) {
            return Err(ExecutionError::ConfigurationError(
                "max rounds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&RunConfig> for DriverConfig {
    fn from(config: &RunConfig) -> Self {
        Self {
            total_records: config.total_records,
            concurrency_limit: config.concurrency_limit,
            backoff: config.backoff.clone(),
            max_rounds: config.max_rounds,
            stall_rounds: config.stall_rounds,
            max_duration: config.max_duration,
            abort_on_fatal: config.abort_on_fatal,
        }
    }
}

/// Why the driver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Pending set drained
    Completed,
    MaxRounds,
    /// Pending set stopped shrinking
    Stalled,
    DeadlineExceeded,
    Cancelled,
    /// A round produced a fatal outcome with abort-on-fatal set
    FatalAbort,
}

impl Termination {
    pub fn is_complete(&self) -> bool {
        matches!(self, Termination::Completed)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Termination::Completed => "completed",
            Termination::MaxRounds => "max rounds reached",
            Termination::Stalled => "stalled",
            Termination::DeadlineExceeded => "deadline exceeded",
            Termination::Cancelled => "cancelled",
            Termination::FatalAbort => "aborted on fatal error",
        };
        f.write_str(label)
    }
}

/// Counters for one round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub round: u32,
    /// Pending ids when the round started
    pub pending: usize,
    pub success: usize,
    pub already_done: usize,
    /// Ids that go back into the pending set
    pub retried: usize,
    pub fatal: usize,
    /// Ids not dispatched because of cancellation
    pub skipped: usize,
    pub elapsed_ms: u64,
}

/// Cumulative counters for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub operation: OperationKind,
    pub total_records: u64,
    pub rounds: u32,
    pub success: u64,
    pub already_done: u64,
    /// Sum of retryable outcomes over all rounds
    pub retried: u64,
    /// Fatal outcomes plus ids abandoned when the run stopped early
    pub fatal: u64,
    /// Ids still pending when the run stopped early
    pub unresolved: u64,
    pub termination: Termination,
    pub per_round: Vec<RoundStats>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunStats {
    fn new(operation: OperationKind, total_records: u64) -> Self {
        Self {
            operation,
            total_records,
            rounds: 0,
            success: 0,
            already_done: 0,
            retried: 0,
            fatal: 0,
            unresolved: 0,
            termination: Termination::Completed,
            per_round: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Ids that ended in one of the terminal outcomes
    pub fn resolved(&self) -> u64 {
        self.success + self.already_done + self.fatal
    }
}

/// Drives one operation kind over the whole record universe
pub struct RetryDriver {
    config: DriverConfig,
    executor: Arc<OperationExecutor>,
    shutdown: ShutdownListener,
}

impl RetryDriver {
    pub fn new(
        config: DriverConfig,
        executor: Arc<OperationExecutor>,
        shutdown: ShutdownListener,
    ) -> Result<Self, ExecutionError> {
        config.validate()?;
        Ok(Self {
            config,
            executor,
            shutdown,
        })
    }

    /// Run rounds until the pending set drains or a limit stops the run
    pub async fn run(mut self) -> RunStats {
        let started = Instant::now();
        let backoff = self.config.backoff.calculator();
        let mut stats = RunStats::new(self.executor.kind(), self.config.total_records);
        let mut pending: BTreeSet<RecordId> = RecordId::universe(self.config.total_records).collect();
        let mut rounds_without_progress = 0u32;

        info!(
            operation = %self.executor.kind(),
            target_name = self.executor.target_name(),
            records = self.config.total_records,
            concurrency = self.config.concurrency_limit,
            timeout_ms = self.executor.timeout().as_millis() as u64,
            "Starting run"
        );

        let termination = loop {
            if pending.is_empty() {
                break Termination::Completed;
            }
            if self.shutdown.is_cancelled() {
                break Termination::Cancelled;
            }
            if let Some(reason) = self.limit_reached(stats.rounds, started) {
                break reason;
            }

            stats.rounds += 1;
            let round = stats.rounds;
            let round_started = Instant::now();
            info!(round, pending = pending.len(), "Round started");

            let ids: Vec<RecordId> = pending.iter().copied().collect();
            let executor = self.executor.clone();
            let results = run_round(
                &ids,
                move |id| {
                    let executor = executor.clone();
                    async move { executor.execute(id).await }
                },
                self.config.concurrency_limit,
                &mut self.shutdown,
            )
            .await;
            debug_assert_eq!(results.len(), ids.len());

            let mut next_pending = BTreeSet::new();
            let mut round_stats = RoundStats {
                round,
                pending: ids.len(),
                skipped: results.skipped.len(),
                ..Default::default()
            };

            for result in &results.results {
                match result.outcome {
                    Outcome::Success => round_stats.success += 1,
                    Outcome::AlreadyDone => round_stats.already_done += 1,
                    Outcome::FatalError => {
                        warn!(record = %result.record_id, "Fatal outcome, record will not be retried");
                        round_stats.fatal += 1;
                    }
                    Outcome::RetryableError => {
                        round_stats.retried += 1;
                        next_pending.insert(result.record_id);
                    }
                }
            }
            next_pending.extend(results.skipped.iter().copied());
            round_stats.elapsed_ms = round_started.elapsed().as_millis() as u64;

            stats.success += round_stats.success as u64;
            stats.already_done += round_stats.already_done as u64;
            stats.retried += round_stats.retried as u64;
            stats.fatal += round_stats.fatal as u64;

            info!(
                round,
                success = round_stats.success,
                already_done = round_stats.already_done,
                failed = round_stats.retried,
                fatal = round_stats.fatal,
                remaining = next_pending.len(),
                "Round finished"
            );

            let shrank = next_pending.len() < pending.len();
            let fatal_this_round = round_stats.fatal > 0;
            stats.per_round.push(round_stats);
            pending = next_pending;

            if pending.is_empty() {
                break Termination::Completed;
            }
            if self.shutdown.is_cancelled() {
                break Termination::Cancelled;
            }
            if fatal_this_round && self.config.abort_on_fatal {
                break Termination::FatalAbort;
            }

            if shrank {
                rounds_without_progress = 0;
            } else {
                rounds_without_progress += 1;
                if let Some(limit) = self.config.stall_rounds {
                    if rounds_without_progress > limit {
                        break Termination::Stalled;
                    }
                }
            }
            if let Some(reason) = self.limit_reached(stats.rounds, started) {
                break reason;
            }

            let delay = self.clamp_to_deadline(backoff.delay_after_round(round), started);
            if !delay.is_zero() {
                info!(round, backoff_ms = delay.as_millis() as u64, "Waiting before next round");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.shutdown.cancelled() => break Termination::Cancelled,
                }
            }
        };

        if !termination.is_complete() {
            stats.unresolved = pending.len() as u64;
            stats.fatal += stats.unresolved;
            warn!(
                %termination,
                unresolved = stats.unresolved,
                "Run stopped before every record resolved"
            );
        }

        stats.termination = termination;
        stats.elapsed = started.elapsed();

        info!(
            %termination,
            rounds = stats.rounds,
            success = stats.success,
            already_done = stats.already_done,
            retried = stats.retried,
            fatal = stats.fatal,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Run finished"
        );

        stats
    }

    /// Never sleep past the run deadline
    fn clamp_to_deadline(&self, delay: Duration, started: Instant) -> Duration {
        match self.config.max_duration {
            Some(max_duration) => delay.min(max_duration.saturating_sub(started.elapsed())),
            None => delay,
        }
    }

    fn limit_reached(&self, rounds: u32, started: Instant) -> Option<Termination> {
        if let Some(max_rounds) = self.config.max_rounds {
            if rounds >= max_rounds {
                debug!(max_rounds, "Round limit reached");
                return Some(Termination::MaxRounds);
            }
        }
        if let Some(max_duration) = self.config.max_duration {
            if started.elapsed() >= max_duration {
                debug!(?max_duration, "Run deadline reached");
                return Some(Termination::DeadlineExceeded);
            }
        }
        None
    }
}
