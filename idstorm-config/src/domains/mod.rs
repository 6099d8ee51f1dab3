//! Configuration split by concern: run, target, network, logging, report

pub mod logging;
pub mod network;
pub mod report;
pub mod run;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Everything a run needs, as loaded from YAML and `IDSTORM_*` overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Round/retry behaviour
    pub run: run::RunConfig,

    /// System under test
    pub target: target::TargetConfig,

    /// Link impairment
    pub network: network::NetworkConfig,

    /// Logging configuration
    pub logging: logging::LoggingConfig,

    /// Final report rendering
    pub report: report::ReportConfig,
}

impl HarnessConfig {
    /// Validate every domain, stopping at the first problem
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.run.validate()?;
        self.target.validate()?;
        self.network.validate()?;
        self.logging.validate()?;
        self.report.validate()?;
        Ok(())
    }

    /// The defaults as a commented YAML document
    pub fn generate_sample() -> String {
        let body = serde_yaml::to_string(&HarnessConfig::default())
            .unwrap_or_else(|e| format!("# defaults could not be rendered: {}\n", e));
        format!(
            "# idstorm configuration\n# Durations are seconds; backoff delays use humantime (\"2s\", \"500ms\").\n{}",
            body
        )
    }
}
