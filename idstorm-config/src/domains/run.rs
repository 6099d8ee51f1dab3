//! Round and retry configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use idstorm_core::ImpairmentScenario;
use idstorm_resilience::{BackoffPolicy, BackoffStrategy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest accepted `concurrency_limit`
pub const MAX_CONCURRENCY_LIMIT: usize = 65_536;

/// Run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of records in the universe (ids 1..=N)
    pub total_records: u64,

    /// Maximum operations in flight at any instant
    pub concurrency_limit: usize,

    /// Upper bound on a single target call; unset picks one from the scenario
    #[serde(with = "crate::domains::utils::serde_duration_option")]
    pub per_call_timeout: Option<Duration>,

    /// Pause between rounds
    pub backoff: BackoffPolicy,

    /// Stop after this many rounds (`null` = unbounded)
    pub max_rounds: Option<u32>,

    /// Stop once more than this many consecutive rounds made no progress (`null` = disabled)
    pub stall_rounds: Option<u32>,

    /// Wall-clock budget for the whole run
    #[serde(with = "crate::domains::utils::serde_duration_option")]
    pub max_duration: Option<Duration>,

    /// Stop after a round that produced a fatal outcome
    pub abort_on_fatal: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            total_records: 5000,
            concurrency_limit: 50,
            per_call_timeout: None,
            backoff: default_backoff(),
            max_rounds: Some(100),
            stall_rounds: Some(10),
            max_duration: None,
            abort_on_fatal: false,
        }
    }
}

impl RunConfig {
    /// Per-call timeout to use under `scenario`
    pub fn effective_timeout(&self, scenario: &ImpairmentScenario) -> Duration {
        self.per_call_timeout
            .unwrap_or_else(|| scenario.recommended_timeout())
    }
}

impl Validatable for RunConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.concurrency_limit, "concurrency_limit", self.domain_name())?;
        if self.concurrency_limit > MAX_CONCURRENCY_LIMIT {
            return Err(self.validation_error(format!(
                "concurrency_limit must be at most {}, got {}",
                MAX_CONCURRENCY_LIMIT, self.concurrency_limit
            )));
        }

        if let Some(timeout) = self.per_call_timeout {
            if timeout.is_zero() {
                return Err(self.validation_error("per_call_timeout must be greater than 0"));
            }
        }

        if self.max_rounds == Some(0) {
            return Err(self.validation_error("max_rounds must be greater than 0 or null"));
        }

        if self.stall_rounds == Some(0) {
            return Err(self.validation_error("stall_rounds must be greater than 0 or null"));
        }

        if let BackoffStrategy::Exponential { base } = self.backoff.strategy {
            if base.is_nan() || base < 1.0 {
                return Err(self.validation_error(format!(
                    "exponential backoff base must be at least 1.0, got {}",
                    base
                )));
            }
        }

        if self.backoff.max_delay < self.backoff.initial_delay {
            log::warn!(
                "backoff max_delay {:?} is below initial_delay {:?}; initial_delay wins",
                self.backoff.max_delay,
                self.backoff.initial_delay
            );
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "run"
    }
}

fn default_backoff() -> BackoffPolicy {
    BackoffPolicy {
        strategy: BackoffStrategy::Fixed,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(30),
        jitter: false,
    }
}
