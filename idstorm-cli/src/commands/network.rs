//! `idstorm network`

use crate::cli::NetworkCommands;
use crate::commands::resolve_interface;
use anyhow::{Context, Result};
use colored::Colorize;
use idstorm_config::HarnessConfig;
use idstorm_core::ImpairmentController;
use idstorm_netem::{warn_if_unprivileged, NetemController};

/// Handle `idstorm network apply|clear|show`
pub async fn network_command(config: &HarnessConfig, command: &NetworkCommands) -> Result<()> {
    let controller = NetemController::from_config(&config.network);
    let configured = config.network.interface.as_deref();

    match command {
        NetworkCommands::Apply { scenario, interface } => {
            let scenario = config
                .network
                .resolve_scenario(scenario)
                .context("Unknown impairment scenario")?;
            let interface = resolve_interface(interface.as_deref(), configured).await?;
            warn_if_unprivileged();

            controller
                .apply(&interface, &scenario)
                .await
                .with_context(|| format!("Failed to apply {} on {}", scenario.name, interface))?;
            println!("{} {} on {}", "✅ Applied".green(), scenario, interface);

            let rule = controller.query(&interface).await?;
            println!("{}", rule.trim_end());
        }
        NetworkCommands::Clear { interface } => {
            let interface = resolve_interface(interface.as_deref(), configured).await?;
            warn_if_unprivileged();

            controller
                .clear(&interface)
                .await
                .with_context(|| format!("Failed to clear shaping on {}", interface))?;
            println!("{} shaping on {}", "✅ Cleared".green(), interface);
        }
        NetworkCommands::Show { interface } => {
            let interface = resolve_interface(interface.as_deref(), configured).await?;
            let rule = controller
                .query(&interface)
                .await
                .with_context(|| format!("Failed to query {}", interface))?;
            println!("{}", rule.trim_end());
        }
    }

    Ok(())
}
