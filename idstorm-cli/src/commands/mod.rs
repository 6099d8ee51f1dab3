//! Subcommand implementations

pub mod config;
pub mod network;
pub mod run;
pub mod scenarios;

use anyhow::{Context, Result};
use idstorm_config::{ConfigLoader, HarnessConfig};
use idstorm_netem::{detect_interface, SYS_CLASS_NET};
use std::path::{Path, PathBuf};
use tracing::info;

/// Load the configuration file (or defaults) with `IDSTORM_*` overrides
pub fn load_config(config_path: Option<&PathBuf>) -> Result<HarnessConfig> {
    let loader = ConfigLoader::new();
    let config = match config_path {
        Some(path) => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => loader.from_env().context("Failed to load configuration")?,
    };
    Ok(config)
}

/// The interface given explicitly, configured, or detected
pub async fn resolve_interface(explicit: Option<&str>, configured: Option<&str>) -> Result<String> {
    if let Some(interface) = explicit.or(configured) {
        return Ok(interface.to_string());
    }
    let detected = detect_interface(Path::new(SYS_CLASS_NET))
        .await
        .context("Failed to detect a network interface, pass --interface")?;
    info!(interface = %detected, "Using detected network interface");
    Ok(detected)
}
