//! Configuration loading and environment variable handling

use crate::domains::HarnessConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "IDSTORM".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<HarnessConfig> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let mut config: HarnessConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<HarnessConfig> {
        let mut config = HarnessConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<HarnessConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut HarnessConfig) -> ConfigResult<()> {
        self.apply_run_overrides(&mut config.run)?;
        self.apply_target_overrides(&mut config.target)?;
        self.apply_network_overrides(&mut config.network)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_run_overrides(&self, config: &mut crate::domains::run::RunConfig) -> ConfigResult<()> {
        if let Some(total) = self.parse_env_var::<u64>("TOTAL_RECORDS")? {
            config.total_records = total;
        }

        if let Some(limit) = self.parse_env_var::<usize>("CONCURRENCY")? {
            config.concurrency_limit = limit;
        }

        if let Some(seconds) = self.parse_env_var::<f64>("CALL_TIMEOUT")? {
            let timeout = Duration::try_from_secs_f64(seconds)
                .map_err(|e| ConfigError::EnvError(format!("Invalid CALL_TIMEOUT: {}", e)))?;
            config.per_call_timeout = Some(timeout);
        }

        if let Some(rounds) = self.parse_env_var::<u32>("MAX_ROUNDS")? {
            config.max_rounds = Some(rounds);
        }

        Ok(())
    }

    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(kind) = self.get_env_var("TARGET") {
            config.kind = crate::domains::target::TargetKind::from_str(&kind)
                .map_err(|_| ConfigError::EnvError(format!("Invalid TARGET: {}", kind)))?;
        }

        if let Ok(url) = self.get_env_var("SCIM_URL") {
            config.scim.base_url = url;
        }

        if let Ok(url) = self.get_env_var("LDAP_URL") {
            config.ldap.url = url;
        }

        if let Ok(password) = self.get_env_var("LDAP_BIND_PASSWORD") {
            config.ldap.bind_password = password;
        }

        Ok(())
    }

    fn apply_network_overrides(
        &self,
        config: &mut crate::domains::network::NetworkConfig,
    ) -> ConfigResult<()> {
        if let Ok(interface) = self.get_env_var("NET_INTERFACE") {
            config.interface = Some(interface);
        }
        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
