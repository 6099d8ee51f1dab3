//! `tc qdisc` driven impairment controller

use crate::errors::ImpairmentError;
use crate::interface::SYS_CLASS_NET;
use async_trait::async_trait;
use idstorm_config::NetworkConfig;
use idstorm_core::{HarnessError, ImpairmentController, ImpairmentScenario};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Messages tc prints when there is no root qdisc to delete
const NO_RULE_MARKERS: [&str; 3] = [
    "No such file or directory",
    "handle of zero",
    "Invalid handle",
];

/// Installs netem as the root qdisc of an interface
#[derive(Debug, Clone)]
pub struct NetemController {
    tc_binary: String,
    sys_net: PathBuf,
}

impl NetemController {
    pub fn new(tc_binary: impl Into<String>) -> Self {
        Self {
            tc_binary: tc_binary.into(),
            sys_net: PathBuf::from(SYS_CLASS_NET),
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.tc_binary.clone())
    }

    /// Look interfaces up somewhere other than `/sys/class/net`
    pub fn with_sys_net(mut self, sys_net: impl Into<PathBuf>) -> Self {
        self.sys_net = sys_net.into();
        self
    }

    pub fn tc_binary(&self) -> &str {
        &self.tc_binary
    }

    pub fn sys_net(&self) -> &Path {
        &self.sys_net
    }

    fn ensure_interface(&self, interface: &str) -> Result<(), ImpairmentError> {
        if interface.is_empty() || interface.contains('/') || !self.sys_net.join(interface).exists() {
            return Err(ImpairmentError::UnknownInterface(interface.to_string()));
        }
        Ok(())
    }

    /// Arguments installing `scenario` on `interface`
    pub fn netem_args(interface: &str, scenario: &ImpairmentScenario) -> Vec<String> {
        vec![
            "qdisc".to_string(),
            "add".to_string(),
            "dev".to_string(),
            interface.to_string(),
            "root".to_string(),
            "netem".to_string(),
            "delay".to_string(),
            format!("{}ms", scenario.delay_ms),
            "loss".to_string(),
            format!("{}%", scenario.loss_pct),
        ]
    }

    async fn tc(&self, args: &[String]) -> Result<String, ImpairmentError> {
        let command = format!("{} {}", self.tc_binary, args.join(" "));
        debug!(command = %command, "Running traffic control command");

        let output = Command::new(&self.tc_binary)
            .args(args)
            .output()
            .await
            .map_err(|source| ImpairmentError::Spawn {
                program: self.tc_binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ImpairmentError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn remove_rule(&self, interface: &str) -> Result<(), ImpairmentError> {
        self.ensure_interface(interface)?;
        let args = ["qdisc", "del", "dev", interface, "root"].map(String::from);
        match self.tc(&args).await {
            Ok(_) => Ok(()),
            Err(ImpairmentError::CommandFailed { stderr, .. })
                if NO_RULE_MARKERS.iter().any(|marker| stderr.contains(marker)) =>
            {
                debug!(interface, "No traffic rule to remove");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn install(&self, interface: &str, scenario: &ImpairmentScenario) -> Result<(), ImpairmentError> {
        self.remove_rule(interface).await?;
        if scenario.is_baseline() {
            info!(interface, "Baseline scenario, link left unshaped");
            return Ok(());
        }
        self.tc(&Self::netem_args(interface, scenario)).await?;
        Ok(())
    }

    async fn show(&self, interface: &str) -> Result<String, ImpairmentError> {
        self.ensure_interface(interface)?;
        let args = ["qdisc", "show", "dev", interface].map(String::from);
        self.tc(&args).await
    }
}

#[async_trait]
impl ImpairmentController for NetemController {
    async fn apply(&self, interface: &str, scenario: &ImpairmentScenario) -> Result<(), HarnessError> {
        Ok(self.install(interface, scenario).await?)
    }

    async fn clear(&self, interface: &str) -> Result<(), HarnessError> {
        Ok(self.remove_rule(interface).await?)
    }

    async fn query(&self, interface: &str) -> Result<String, HarnessError> {
        Ok(self.show(interface).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netem_args() {
        let scenario = ImpairmentScenario::lookup("tactical-radio", &[]).unwrap();
        assert_eq!(
            NetemController::netem_args("eth0", &scenario).join(" "),
            "qdisc add dev eth0 root netem delay 100ms loss 5%"
        );

        let fractional = ImpairmentScenario::new("lab", 30, 0.5);
        assert!(NetemController::netem_args("eth0", &fractional)
            .join(" ")
            .ends_with("delay 30ms loss 0.5%"));
    }

    #[tokio::test]
    async fn test_unknown_interface_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let controller = NetemController::new("tc").with_sys_net(dir.path());

        let err = controller.clear("eth9").await.unwrap_err();
        assert!(matches!(err, HarnessError::Impairment(message) if message.contains("eth9")));
    }

    #[tokio::test]
    async fn test_missing_tc_binary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("eth0")).unwrap();
        let controller = NetemController::new("/nonexistent/idstorm-tc").with_sys_net(dir.path());

        let err = controller.show("eth0").await.unwrap_err();
        assert!(matches!(err, ImpairmentError::Spawn { .. }));
    }
}
