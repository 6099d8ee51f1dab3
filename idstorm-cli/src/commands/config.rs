//! `idstorm config`

use crate::commands::load_config;
use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use idstorm_config::{ConfigLoader, HarnessConfig};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

/// Handle configuration validation
pub fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {}", config_file.display());

    if !config_file.exists() {
        bail!("Configuration file not found: {}", config_file.display());
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_) => {
            println!("{}", "✅ Configuration file is valid".green());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "❌ Configuration validation failed:".red(), e);
            error!("Configuration validation failed: {}", e);
            Err(anyhow!(e))
        }
    }
}

/// Handle sample configuration generation
pub fn handle_config_generate(output: Option<&PathBuf>, force: bool) -> Result<()> {
    let sample = HarnessConfig::generate_sample();

    let Some(output) = output else {
        print!("{}", sample);
        return Ok(());
    };

    if output.exists() && !force {
        bail!(
            "Output file already exists: {}. Use --force to overwrite.",
            output.display()
        );
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    fs::write(output, sample).context("Failed to write configuration file")?;

    println!("✅ Sample configuration generated at: {}", output.display());
    println!(
        "🔧 Validate with: idstorm config validate --config-file {}",
        output.display()
    );
    Ok(())
}

/// Handle configuration display
pub fn handle_config_show(config_file: Option<&PathBuf>, format: &str) -> Result<()> {
    let config = load_config(config_file)?;

    match format.to_lowercase().as_str() {
        "yaml" | "yml" => {
            let yaml = serde_yaml::to_string(&config).context("Failed to serialize to YAML")?;
            print!("{}", yaml);
        }
        "json" => {
            let json = serde_json::to_string_pretty(&config).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
        _ => bail!("Unknown output format: {}. Valid formats: yaml, json", format),
    }
    Ok(())
}
