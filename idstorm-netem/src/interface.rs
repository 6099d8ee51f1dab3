//! Interface discovery

use crate::errors::ImpairmentError;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Where the kernel lists network interfaces
pub const SYS_CLASS_NET: &str = "/sys/class/net";

const LOOPBACK: &str = "lo";

/// Interface names under `sys_net`, sorted
pub fn list_interfaces(sys_net: &Path) -> Result<Vec<String>, ImpairmentError> {
    let entries = std::fs::read_dir(sys_net).map_err(|source| ImpairmentError::Sysfs {
        path: sys_net.display().to_string(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    Ok(names)
}

/// The `dev` field of `ip route show default` output
pub fn parse_default_route_dev(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("default"))
        .find_map(|line| {
            let mut fields = line.split_whitespace();
            fields.find(|field| *field == "dev")?;
            fields.next().map(str::to_string)
        })
}

/// Pick the interface to shape.
///
/// A single non-loopback interface wins outright; otherwise the default
/// route's device if it is known, otherwise the first non-loopback one.
pub fn choose_interface(candidates: &[String], default_route_dev: Option<&str>) -> Option<String> {
    let physical: Vec<&String> = candidates.iter().filter(|name| *name != LOOPBACK).collect();

    if let [only] = physical.as_slice() {
        return Some((*only).clone());
    }
    if let Some(dev) = default_route_dev {
        if physical.iter().any(|name| *name == dev) {
            return Some(dev.to_string());
        }
    }
    physical.first().map(|name| (*name).clone())
}

/// Detect the interface facing the target
pub async fn detect_interface(sys_net: &Path) -> Result<String, ImpairmentError> {
    let candidates = list_interfaces(sys_net)?;

    let route_dev = match Command::new("ip").args(["route", "show", "default"]).output().await {
        Ok(output) if output.status.success() => {
            parse_default_route_dev(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            debug!(status = %output.status, "ip route lookup failed");
            None
        }
        Err(e) => {
            debug!("ip route lookup unavailable: {}", e);
            None
        }
    };

    let chosen = choose_interface(&candidates, route_dev.as_deref()).ok_or(ImpairmentError::NoInterface)?;
    debug!(interface = %chosen, ?candidates, "Detected network interface");
    Ok(chosen)
}

/// Warn when the effective uid is not root; returns whether it is
pub fn warn_if_unprivileged() -> bool {
    let root = nix::unistd::geteuid().is_root();
    if !root {
        warn!("Not running as root: traffic shaping commands will most likely be refused");
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_default_route() {
        let output = "default via 192.168.1.1 dev enp3s0 proto dhcp metric 100\n";
        assert_eq!(parse_default_route_dev(output), Some("enp3s0".to_string()));

        let multi = "10.0.0.0/8 dev tun0 scope link\ndefault via 10.1.1.1 dev wlan0\n";
        assert_eq!(parse_default_route_dev(multi), Some("wlan0".to_string()));

        assert_eq!(parse_default_route_dev(""), None);
        assert_eq!(parse_default_route_dev("default via 10.0.0.1"), None);
    }

    #[test]
    fn test_single_interface_wins() {
        assert_eq!(
            choose_interface(&names(&["eth0", "lo"]), Some("wlan0")),
            Some("eth0".to_string())
        );
    }

    #[test]
    fn test_default_route_breaks_ties() {
        let candidates = names(&["docker0", "eth0", "lo", "wlan0"]);
        assert_eq!(choose_interface(&candidates, Some("wlan0")), Some("wlan0".to_string()));
        assert_eq!(choose_interface(&candidates, None), Some("docker0".to_string()));
        assert_eq!(choose_interface(&candidates, Some("ppp0")), Some("docker0".to_string()));
    }

    #[test]
    fn test_loopback_only() {
        assert_eq!(choose_interface(&names(&["lo"]), None), None);
    }

    #[test]
    fn test_list_interfaces_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["lo", "eth1", "eth0"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        assert_eq!(list_interfaces(dir.path()).unwrap(), names(&["eth0", "eth1", "lo"]));
    }
}
