//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use idstorm_config::{ReportFormat, TargetKind};
use idstorm_core::OperationKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error) or a full filter directive
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive one operation over every record until all of them are resolved
    Run(RunArgs),

    /// List the impairment scenario catalog
    Scenarios,

    /// Apply, clear or inspect traffic shaping without running a load
    Network {
        #[command(subcommand)]
        network_cmd: NetworkCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Operation applied to every record: insert, update, delete
    #[arg(long, value_name = "KIND")]
    pub operation: OperationKind,

    /// Target kind: scim, ldap, memory
    #[arg(long, value_name = "KIND")]
    pub target: Option<TargetKind>,

    /// Number of records (ids 1..=N)
    #[arg(long, value_name = "N")]
    pub records: Option<u64>,

    /// Operations in flight at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Impairment scenario name or catalog index; enables shaping
    #[arg(long, value_name = "NAME|INDEX")]
    pub scenario: Option<String>,

    /// Interface to shape; enables shaping
    #[arg(long, value_name = "IF")]
    pub interface: Option<String>,

    /// Leave the link alone even if the configuration enables shaping
    #[arg(long, conflicts_with_all = ["scenario", "interface"])]
    pub no_network: bool,

    /// Give up after this many rounds
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<u32>,

    /// Report format on stdout: text, json
    #[arg(long, value_name = "FORMAT")]
    pub output: Option<ReportFormat>,

    /// Also write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    pub report_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum NetworkCommands {
    /// Install a scenario on the interface
    Apply {
        /// Scenario name or catalog index
        #[arg(value_name = "NAME|INDEX")]
        scenario: String,

        /// Interface to shape (auto-detected when omitted)
        #[arg(long, value_name = "IF")]
        interface: Option<String>,
    },

    /// Remove shaping from the interface
    Clear {
        /// Interface to clear (auto-detected when omitted)
        #[arg(long, value_name = "IF")]
        interface: Option<String>,
    },

    /// Show the rule currently installed
    Show {
        /// Interface to inspect (auto-detected when omitted)
        #[arg(long, value_name = "IF")]
        interface: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path (stdout when omitted)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "idstorm",
            "--log-level",
            "debug",
            "run",
            "--operation",
            "insert",
            "--target",
            "ldap",
            "--records",
            "250",
            "--scenario",
            "satellite",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.operation, OperationKind::Create);
                assert_eq!(args.target, Some(TargetKind::Ldap));
                assert_eq!(args.records, Some(250));
                assert_eq!(args.scenario.as_deref(), Some("satellite"));
                assert_eq!(args.output, Some(ReportFormat::Json));
                assert!(!args.no_network);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_operation_is_required() {
        assert!(Cli::try_parse_from(["idstorm", "run"]).is_err());
        assert!(Cli::try_parse_from(["idstorm", "run", "--operation", "upsert"]).is_err());
    }

    #[test]
    fn test_no_network_conflicts_with_scenario() {
        let result = Cli::try_parse_from([
            "idstorm",
            "run",
            "--operation",
            "delete",
            "--no-network",
            "--scenario",
            "disaster",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["idstorm", "scenarios", "--config", "lab.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("lab.yaml")));
    }
}
