//! `idstorm run`

use crate::cli::RunArgs;
use crate::commands::resolve_interface;
use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use idstorm_config::{HarnessConfig, ReportFormat, TargetKind};
use idstorm_core::{ImpairmentScenario, OperationKind, RecordTemplate, TargetOperations};
use idstorm_execution::{
    summarize, with_impairment, DriverConfig, ImpairmentPlan, InMemoryTarget, OperationExecutor,
    RetryDriver, RunReport, RunStats,
};
use idstorm_http::ScimTarget;
use idstorm_ldap::LdapCliTarget;
use idstorm_netem::{warn_if_unprivileged, ClearGuard, NetemController};
use idstorm_resilience::{ShutdownCoordinator, ShutdownListener};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fold command line flags into the loaded configuration and re-validate
pub fn apply_overrides(config: &mut HarnessConfig, args: &RunArgs) -> Result<()> {
    if let Some(target) = args.target {
        config.target.kind = target;
    }
    if let Some(records) = args.records {
        config.run.total_records = records;
    }
    if let Some(concurrency) = args.concurrency {
        config.run.concurrency_limit = concurrency;
    }
    if let Some(seconds) = args.timeout {
        let timeout = Duration::try_from_secs_f64(seconds)
            .map_err(|_| anyhow!("Invalid --timeout value: {}", seconds))?;
        config.run.per_call_timeout = Some(timeout);
    }
    if let Some(scenario) = &args.scenario {
        config.network.scenario = scenario.clone();
        config.network.enabled = true;
    }
    if let Some(interface) = &args.interface {
        config.network.interface = Some(interface.clone());
        config.network.enabled = true;
    }
    if args.no_network {
        config.network.enabled = false;
    }
    if let Some(max_rounds) = args.max_rounds {
        config.run.max_rounds = Some(max_rounds);
    }
    if let Some(format) = args.output {
        config.report.format = format;
    }
    if let Some(path) = &args.report_file {
        config.report.output_file = Some(path.clone());
    }

    config.validate_all().context("Invalid run configuration")?;
    Ok(())
}

/// Uid prefix of the generated records for the configured target
fn uid_prefix(config: &HarnessConfig) -> &str {
    match config.target.kind {
        TargetKind::Ldap => &config.target.ldap.uid_prefix,
        TargetKind::Scim | TargetKind::Memory => "user",
    }
}

fn build_target(
    config: &HarnessConfig,
    template: &RecordTemplate,
    timeout: Duration,
) -> Result<Arc<dyn TargetOperations>> {
    let target: Arc<dyn TargetOperations> = match config.target.kind {
        TargetKind::Scim => Arc::new(
            ScimTarget::from_config(&config.target.scim, timeout)
                .context("Failed to create HTTP target")?,
        ),
        TargetKind::Ldap => Arc::new(
            LdapCliTarget::from_config(&config.target.ldap, timeout)
                .context("Failed to create LDAP target")?,
        ),
        TargetKind::Memory => {
            let memory = InMemoryTarget::from_config(&config.target.memory);
            if config.target.memory.preload {
                memory.preload(template, config.run.total_records);
            }
            Arc::new(memory)
        }
    };
    Ok(target)
}

/// Run one operation over every record and build the report.
///
/// `shutdown` cancels the run between dispatches; impairment, when enabled,
/// is applied before the first round and cleared after the last.
pub async fn execute_run(
    config: &HarnessConfig,
    operation: OperationKind,
    shutdown: ShutdownListener,
) -> Result<RunReport> {
    let scenario = if config.network.enabled {
        config.network.scenario().context("Invalid impairment scenario")?
    } else {
        ImpairmentScenario::baseline()
    };
    let timeout = config.run.effective_timeout(&scenario);

    let run_stamp = chrono::Local::now().format("%H:%M:%S").to_string();
    let template = RecordTemplate::new(uid_prefix(config), run_stamp);
    let target = build_target(config, &template, timeout)?;
    let target_name = target.name().to_string();

    let executor = Arc::new(OperationExecutor::new(target, operation, template, timeout));
    let driver = RetryDriver::new(DriverConfig::from(&config.run), executor, shutdown)
        .context("Failed to prepare the retry driver")?;

    debug!(
        target_name = %target_name,
        scenario = %scenario,
        network = config.network.enabled,
        "Run prepared"
    );

    let (stats, scenario_label) = if config.network.enabled {
        let stats = run_impaired(config, &scenario, driver).await;
        (stats, scenario.name.clone())
    } else {
        (driver.run().await, "none".to_string())
    };

    Ok(summarize(&stats, stats.elapsed).labelled(target_name, scenario_label))
}

async fn run_impaired(config: &HarnessConfig, scenario: &ImpairmentScenario, driver: RetryDriver) -> RunStats {
    warn_if_unprivileged();

    let interface = match resolve_interface(None, config.network.interface.as_deref()).await {
        Ok(interface) => interface,
        Err(e) => {
            warn!("{:#}; running without shaping", e);
            return driver.run().await;
        }
    };

    let controller = NetemController::from_config(&config.network);
    let mut guard = ClearGuard::new(controller.tc_binary(), interface.clone());
    let plan = ImpairmentPlan {
        interface,
        scenario: scenario.clone(),
        settle_delay: config.network.settle_delay,
    };

    let stats = with_impairment(&controller, &plan, || driver.run()).await;
    guard.disarm();
    stats
}

fn print_report(report: &RunReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => {
            println!("{}", report.to_json().context("Failed to serialize report")?);
        }
        ReportFormat::Text => {
            println!("{}", report.render_text());
            if report.is_complete() {
                println!("{}", "✅ All records resolved".green());
            } else {
                println!(
                    "{}",
                    format!(
                        "❌ Run stopped early ({}), {} records unresolved",
                        report.termination, report.unresolved_count
                    )
                    .red()
                );
            }
        }
    }
    Ok(())
}

/// Handle `idstorm run`
pub async fn run_command(mut config: HarnessConfig, args: &RunArgs) -> Result<()> {
    apply_overrides(&mut config, args)?;

    let coordinator = ShutdownCoordinator::new();
    let signal_task = coordinator.install_ctrl_c_handler();

    let result = execute_run(&config, args.operation, coordinator.subscribe()).await;
    signal_task.abort();
    let report = result?;

    print_report(&report, config.report.format)?;
    if let Some(path) = &config.report.output_file {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if !report.is_complete() {
        bail!(
            "Run ended with {} after {} rounds",
            report.termination,
            report.rounds
        );
    }
    Ok(())
}
