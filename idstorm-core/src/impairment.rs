//! Network impairment port and scenario catalog

use crate::error::HarnessError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A named (delay, loss) pair used to degrade the link during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpairmentScenario {
    pub name: String,
    pub delay_ms: u32,
    pub loss_pct: f64,
}

impl ImpairmentScenario {
    pub fn new(name: impl Into<String>, delay_ms: u32, loss_pct: f64) -> Self {
        Self {
            name: name.into(),
            delay_ms,
            loss_pct,
        }
    }

    /// Undegraded link
    pub fn baseline() -> Self {
        Self::new("baseline", 0, 0.0)
    }

    /// Whether applying this scenario means installing no rule at all
    pub fn is_baseline(&self) -> bool {
        self.delay_ms == 0 && self.loss_pct <= 0.0
    }

    /// Built-in scenarios, indexed by their menu position
    pub fn builtin() -> Vec<ImpairmentScenario> {
        vec![
            Self::baseline(),
            Self::new("satellite", 600, 1.0),
            Self::new("tactical-radio", 100, 5.0),
            Self::new("disaster", 200, 15.0),
            Self::new("extreme-chaos", 500, 40.0),
            Self::new("partial-degradation", 800, 70.0),
            Self::new("total-degradation", 1200, 95.0),
        ]
    }

    /// Built-ins merged with `custom`.
    ///
    /// Custom scenarios shadow built-ins of the same name and are indexed after them.
    pub fn catalog(custom: &[ImpairmentScenario]) -> Vec<ImpairmentScenario> {
        let mut catalog = Self::builtin();
        for scenario in custom {
            match catalog.iter_mut().find(|s| s.name.eq_ignore_ascii_case(&scenario.name)) {
                Some(existing) => *existing = scenario.clone(),
                None => catalog.push(scenario.clone()),
            }
        }
        catalog
    }

    /// Find a scenario by name or catalog index
    pub fn lookup(selector: &str, custom: &[ImpairmentScenario]) -> Option<ImpairmentScenario> {
        let catalog = Self::catalog(custom);

        if let Ok(index) = selector.trim().parse::<usize>() {
            return catalog.get(index).cloned();
        }

        catalog
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(selector.trim()))
    }

    /// Per-call timeout suited to this scenario when none was given explicitly.
    ///
    /// Near-total loss gets a shorter timeout so dead attempts are recycled
    /// into the next round sooner.
    pub fn recommended_timeout(&self) -> Duration {
        if self.loss_pct >= 90.0 {
            Duration::from_secs(3)
        } else {
            Duration::from_secs(5)
        }
    }
}

impl fmt::Display for ImpairmentScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (delay {}ms, loss {}%)",
            self.name, self.delay_ms, self.loss_pct
        )
    }
}

/// Applies and clears traffic shaping on a network interface
#[async_trait]
pub trait ImpairmentController: Send + Sync {
    /// Replace any rule on `interface` with `scenario`
    async fn apply(
        &self,
        interface: &str,
        scenario: &ImpairmentScenario,
    ) -> Result<(), HarnessError>;

    /// Remove shaping from `interface`
    async fn clear(&self, interface: &str) -> Result<(), HarnessError>;

    /// Human-readable description of the rule currently installed
    async fn query(&self, interface: &str) -> Result<String, HarnessError>;
}
