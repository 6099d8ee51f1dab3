//! Report output configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Invalid report format: {}", s)),
        }
    }
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,

    /// Also write the JSON report here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
}

impl Validatable for ReportConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(path) = &self.output_file {
            if path.as_os_str().is_empty() {
                return Err(self.validation_error("output_file cannot be empty"));
            }
            if path.is_dir() {
                return Err(self.validation_error(format!(
                    "output_file {} is a directory",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "report"
    }
}
