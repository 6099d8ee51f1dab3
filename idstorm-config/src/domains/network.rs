//! Network impairment configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use idstorm_core::ImpairmentScenario;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Shape the link during runs
    pub enabled: bool,

    /// Interface to shape; auto-detected when unset
    pub interface: Option<String>,

    pub tc_binary: String,

    /// Scenario name or catalog index
    pub scenario: String,

    pub custom_scenarios: Vec<ImpairmentScenario>,

    /// Pause after installing a rule before the first round
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub settle_delay: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interface: None,
            tc_binary: "tc".to_string(),
            scenario: "baseline".to_string(),
            custom_scenarios: Vec::new(),
            settle_delay: Duration::from_secs(1),
        }
    }
}

impl NetworkConfig {
    /// Resolve a scenario selector against the built-in and custom catalog
    pub fn resolve_scenario(&self, selector: &str) -> ConfigResult<ImpairmentScenario> {
        ImpairmentScenario::lookup(selector, &self.custom_scenarios)
            .ok_or_else(|| self.validation_error(format!("unknown scenario '{}'", selector)))
    }

    /// The configured scenario
    pub fn scenario(&self) -> ConfigResult<ImpairmentScenario> {
        self.resolve_scenario(&self.scenario)
    }
}

impl Validatable for NetworkConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.tc_binary, "tc_binary", self.domain_name())?;

        if let Some(interface) = &self.interface {
            validate_required_string(interface, "interface", self.domain_name())?;
        }

        for custom in &self.custom_scenarios {
            validate_required_string(&custom.name, "custom_scenarios.name", self.domain_name())?;
            if !(0.0..=100.0).contains(&custom.loss_pct) {
                return Err(self.validation_error(format!(
                    "scenario '{}' loss_pct must be within 0..=100, got {}",
                    custom.name, custom.loss_pct
                )));
            }
        }

        self.scenario()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "network"
    }
}
