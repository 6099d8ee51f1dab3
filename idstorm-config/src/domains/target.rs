//! System-under-test configuration

use crate::error::ConfigResult;
use crate::validation::{validate_range, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which target backend a run talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Scim,
    Ldap,
    Memory,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Scim => "scim",
            TargetKind::Ldap => "ldap",
            TargetKind::Memory => "memory",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scim" | "http" | "https" => Ok(TargetKind::Scim),
            "ldap" | "ldaps" => Ok(TargetKind::Ldap),
            "memory" | "mem" => Ok(TargetKind::Memory),
            _ => Err(format!("Invalid target kind: {}", s)),
        }
    }
}

/// Target configuration; only the section matching `kind` is validated
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TargetConfig {
    pub kind: TargetKind,
    pub scim: ScimConfig,
    pub ldap: LdapConfig,
    pub memory: MemoryTargetConfig,
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.kind {
            TargetKind::Scim => self.scim.validate(),
            TargetKind::Ldap => self.ldap.validate(),
            TargetKind::Memory => self.memory.validate(),
        }
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

/// HTTP provisioning endpoint (`/Users` collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScimConfig {
    /// Collection URL; records live at `{base_url}/{uid}`
    pub base_url: String,

    /// Verify server certificates on https
    #[serde(default = "crate::domains::utils::default_true")]
    pub verify_tls: bool,

    pub user_agent: String,

    /// Statuses meaning "record already exists" on create
    pub conflict_statuses: Vec<u16>,

    /// Statuses that make an id terminal as fatal
    pub fatal_statuses: Vec<u16>,

    /// How long idle pooled connections are kept
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub pool_idle_timeout: Duration,

    /// Pooled idle connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl Default for ScimConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/Users".to_string(),
            verify_tls: true,
            user_agent: format!("idstorm/{}", env!("CARGO_PKG_VERSION")),
            conflict_statuses: vec![409],
            fatal_statuses: Vec::new(),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 50,
        }
    }
}

impl Validatable for ScimConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, &["http", "https"], "base_url", self.domain_name())?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;

        for status in self.conflict_statuses.iter().chain(&self.fatal_statuses) {
            if !(100..=599).contains(status) {
                return Err(self.validation_error(format!("{} is not an HTTP status", status)));
            }
        }

        if let Some(status) = self
            .conflict_statuses
            .iter()
            .find(|s| self.fatal_statuses.contains(s))
        {
            return Err(self.validation_error(format!(
                "status {} is listed as both conflict and fatal",
                status
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target.scim"
    }
}

/// Directory server reached through the OpenLDAP client tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapConfig {
    /// `ldap://host:port` or `ldaps://host:port`
    pub url: String,

    pub bind_dn: String,

    pub bind_password: String,

    /// Entries are created as `uid={uid},{base_dn}`
    pub base_dn: String,

    /// Verify server certificates on ldaps
    #[serde(default = "crate::domains::utils::default_true")]
    pub verify_tls: bool,

    pub uid_prefix: String,

    /// `userPassword` set on created entries
    pub initial_password: Option<String>,

    /// Result codes that make an id terminal as fatal (e.g. 49 invalidCredentials)
    pub fatal_codes: Vec<i32>,

    pub ldapadd: String,
    pub ldapmodify: String,
    pub ldapdelete: String,
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            url: "ldap://127.0.0.1:389".to_string(),
            bind_dn: "cn=admin,dc=example,dc=org".to_string(),
            bind_password: String::new(),
            base_dn: "dc=example,dc=org".to_string(),
            verify_tls: true,
            uid_prefix: "user_ldap_".to_string(),
            initial_password: None,
            fatal_codes: Vec::new(),
            ldapadd: "ldapadd".to_string(),
            ldapmodify: "ldapmodify".to_string(),
            ldapdelete: "ldapdelete".to_string(),
        }
    }
}

impl Validatable for LdapConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        validate_url(&self.url, &["ldap", "ldaps"], "url", domain)?;
        validate_required_string(&self.bind_dn, "bind_dn", domain)?;
        validate_required_string(&self.base_dn, "base_dn", domain)?;
        validate_required_string(&self.uid_prefix, "uid_prefix", domain)?;
        validate_required_string(&self.ldapadd, "ldapadd", domain)?;
        validate_required_string(&self.ldapmodify, "ldapmodify", domain)?;
        validate_required_string(&self.ldapdelete, "ldapdelete", domain)?;

        if self.fatal_codes.iter().any(|c| [0, 32, 68].contains(c)) {
            return Err(self.validation_error(
                "fatal_codes cannot contain 0, 32 (noSuchObject) or 68 (entryAlreadyExists)",
            ));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target.ldap"
    }
}

/// In-process simulated store
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MemoryTargetConfig {
    /// Probability in `[0, 1)` that a call fails with a transport error
    pub failure_rate: f64,

    /// Seed for the failure generator; random when unset
    pub seed: Option<u64>,

    /// Simulated latency per call
    pub latency_ms: u64,

    /// Start with every record of the universe present
    pub preload: bool,
}

impl Validatable for MemoryTargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_range(self.failure_rate, 0.0, 1.0, "failure_rate", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "target.memory"
    }
}
