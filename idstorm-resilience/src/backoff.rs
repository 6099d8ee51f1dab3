//! Backoff strategies applied between retry rounds

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy between rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay after every round
    #[default]
    Fixed,

    /// Linear increase: delay = initial_delay * round
    Linear,

    /// Exponential increase: delay = initial_delay * base^(round-1)
    Exponential {
        /// Base for exponential calculation (e.g., 2.0 for doubling)
        base: f64,
    },
}

/// Serializable backoff settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    #[serde(default)]
    pub strategy: BackoffStrategy,

    /// Delay after the first failed round
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Upper bound for any delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Whether to spread delays by +/-20%
    #[serde(default)]
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

impl BackoffPolicy {
    /// Constant pause between rounds
    pub fn fixed(delay: Duration) -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            initial_delay: delay,
            max_delay: delay,
            jitter: false,
        }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn calculator(&self) -> BackoffCalculator {
        BackoffCalculator::new(
            self.strategy.clone(),
            self.initial_delay,
            self.max_delay,
            self.jitter,
        )
    }
}

/// Backoff delay calculator
#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    strategy: BackoffStrategy,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl BackoffCalculator {
    /// Create a new backoff calculator
    pub fn new(
        strategy: BackoffStrategy,
        initial_delay: Duration,
        max_delay: Duration,
        jitter: bool,
    ) -> Self {
        Self {
            strategy,
            initial_delay,
            max_delay: max_delay.max(initial_delay),
            jitter,
        }
    }

    /// Delay to wait after `round` (1-indexed) left work pending
    pub fn delay_after_round(&self, round: u32) -> Duration {
        let base_delay = self.base_delay(round);
        let capped_delay = base_delay.min(self.max_delay);

        if self.jitter {
            add_jitter(capped_delay)
        } else {
            capped_delay
        }
    }

    fn base_delay(&self, round: u32) -> Duration {
        match &self.strategy {
            BackoffStrategy::Fixed => self.initial_delay,

            BackoffStrategy::Linear => self.initial_delay.saturating_mul(round.max(1)),

            BackoffStrategy::Exponential { base } => {
                if round == 0 {
                    return Duration::ZERO;
                }
                let multiplier = base.powi(round as i32 - 1);
                let nanos = self.initial_delay.as_nanos() as f64 * multiplier;
                if !nanos.is_finite() || nanos >= u64::MAX as f64 {
                    return self.max_delay;
                }
                Duration::from_nanos(nanos as u64)
            }
        }
    }
}

fn add_jitter(delay: Duration) -> Duration {
    if delay.is_zero() {
        return delay;
    }
    let mut rng = rand::thread_rng();
    let jitter_factor = rng.gen_range(0.8..1.2);
    Duration::from_nanos((delay.as_nanos() as f64 * jitter_factor) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let calc = BackoffPolicy::fixed(Duration::from_secs(2)).calculator();

        assert_eq!(calc.delay_after_round(1), Duration::from_secs(2));
        assert_eq!(calc.delay_after_round(2), Duration::from_secs(2));
        assert_eq!(calc.delay_after_round(40), Duration::from_secs(2));
    }

    #[test]
    fn test_linear_backoff() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Linear,
            Duration::from_millis(100),
            Duration::from_secs(1),
            false,
        );

        assert_eq!(calc.delay_after_round(1), Duration::from_millis(100));
        assert_eq!(calc.delay_after_round(5), Duration::from_millis(500));
        assert_eq!(calc.delay_after_round(20), Duration::from_secs(1)); // Capped at max
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Exponential { base: 2.0 },
            Duration::from_millis(100),
            Duration::from_millis(500),
            false,
        );

        assert_eq!(calc.delay_after_round(1), Duration::from_millis(100));
        assert_eq!(calc.delay_after_round(2), Duration::from_millis(200));
        assert_eq!(calc.delay_after_round(3), Duration::from_millis(400));
        assert_eq!(calc.delay_after_round(4), Duration::from_millis(500));
        assert_eq!(calc.delay_after_round(200), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Fixed,
            Duration::from_millis(1000),
            Duration::from_secs(10),
            true,
        );

        for round in 1..20 {
            let delay = calc.delay_after_round(round);
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1200));
        }
    }

    #[test]
    fn test_policy_deserializes_humantime() {
        let json = r#"{"strategy":{"type":"exponential","base":1.5},"initial_delay":"500ms","max_delay":"10s"}"#;
        let policy: BackoffPolicy = serde_json::from_str(json).unwrap();

        assert_eq!(policy.strategy, BackoffStrategy::Exponential { base: 1.5 });
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert!(!policy.jitter);
    }
}
