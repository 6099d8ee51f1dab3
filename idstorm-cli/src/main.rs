mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ConfigCommands};
use commands::config::{handle_config_generate, handle_config_show, handle_config_validate};
use commands::network::network_command;
use commands::run::run_command;
use commands::scenarios::scenarios_command;
use commands::load_config;
use idstorm_logging::{init_logging_from_config, init_simple_tracing};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config subcommands must work even when the configuration itself is broken
    if let Some(Commands::Config { config_cmd }) = &cli.command {
        init_simple_tracing(cli.log_level.as_deref())?;
        return match config_cmd {
            ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
            ConfigCommands::Generate { output, force } => {
                handle_config_generate(output.as_ref(), *force)
            }
            ConfigCommands::Show { format } => handle_config_show(cli.config.as_ref(), format),
        };
    }

    let config = load_config(cli.config.as_ref())?;
    let _logging = init_logging_from_config(&config.logging, cli.log_level.as_deref())
        .context("Failed to initialize logging")?;

    info!("idstorm {} starting", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Some(Commands::Run(args)) => run_command(config, args).await,
        Some(Commands::Scenarios) => {
            scenarios_command(&config);
            Ok(())
        }
        Some(Commands::Network { network_cmd }) => network_command(&config, network_cmd).await,
        Some(Commands::Config { .. }) => Ok(()),
        None => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}
