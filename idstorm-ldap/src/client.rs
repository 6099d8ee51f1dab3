//! LDAP target backed by the OpenLDAP command line clients

use crate::errors::LdapError;
use crate::ldif;
use crate::tools::check_tools;
use async_trait::async_trait;
use idstorm_config::LdapConfig;
use idstorm_core::{
    IdentityRecord, Status, StatusClass, TargetOperations, TargetResponse, TransportError,
};
use std::io::Write;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

/// entryAlreadyExists
const LDAP_ALREADY_EXISTS: i32 = 68;
/// noSuchObject
const LDAP_NO_SUCH_OBJECT: i32 = 32;
/// Exit status of the clients when the server cannot be reached
const CLIENT_SERVER_DOWN: i32 = 255;

/// One client process per operation, bound with simple authentication
#[derive(Debug, Clone)]
pub struct LdapCliTarget {
    config: LdapConfig,
    timeout: Duration,
    /// Bind password handed to the clients with `-y`; removed on drop
    password_file: Arc<NamedTempFile>,
}

/// Owner-only file holding the bind password, without a trailing newline
fn write_password_file(password: &str) -> Result<NamedTempFile, LdapError> {
    let mut file = tempfile::Builder::new()
        .prefix("idstorm-bind-")
        .tempfile()
        .map_err(LdapError::PasswordFile)?;
    file.write_all(password.as_bytes())
        .map_err(LdapError::PasswordFile)?;
    file.flush().map_err(LdapError::PasswordFile)?;
    Ok(file)
}

impl LdapCliTarget {
    /// Build the target after checking the URL and the client tools
    pub fn from_config(config: &LdapConfig, timeout: Duration) -> Result<Self, LdapError> {
        let url = url::Url::parse(&config.url)
            .map_err(|e| LdapError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        if !matches!(url.scheme(), "ldap" | "ldaps") {
            return Err(LdapError::InvalidUrl(format!(
                "{}: scheme must be ldap or ldaps",
                config.url
            )));
        }
        check_tools(config)?;
        let password_file = write_password_file(&config.bind_password)?;

        debug!(
            url = %config.url,
            bind_dn = %config.bind_dn,
            verify_tls = config.verify_tls,
            "Creating LDAP target"
        );

        Ok(Self {
            config: config.clone(),
            timeout,
            password_file: Arc::new(password_file),
        })
    }

    fn dn(&self, record: &IdentityRecord) -> String {
        ldif::entry_dn(&record.uid, &self.config.base_dn)
    }

    fn command(&self, program: &str) -> Command {
        let network_timeout = self.timeout.as_secs().max(1);
        let mut cmd = Command::new(program);
        cmd.arg("-x")
            .arg("-H")
            .arg(&self.config.url)
            .arg("-D")
            .arg(&self.config.bind_dn)
            .arg("-y")
            .arg(self.password_file.path())
            .arg("-o")
            .arg(format!("nettimeout={}", network_timeout))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !self.config.verify_tls {
            cmd.env("LDAPTLS_REQCERT", "never");
        }
        cmd
    }

    async fn run(&self, mut cmd: Command, input: Option<String>) -> TargetResponse {
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd
            .spawn()
            .map_err(|e| TransportError::Io(format!("failed to start LDAP client: {}", e)))?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            // The client may exit before reading everything (e.g. bind failure)
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                trace!("LDAP client closed stdin early: {}", e);
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TransportError::Io(format!("failed to wait for LDAP client: {}", e)))?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        self.interpret_exit(output.status, stderr.trim())
    }

    fn interpret_exit(&self, status: ExitStatus, stderr: &str) -> TargetResponse {
        let code = match status.code() {
            Some(code) => code,
            None => {
                return Err(TransportError::Aborted(format!(
                    "LDAP client terminated by signal: {}",
                    status
                )))
            }
        };

        trace!(code, stderr, "LDAP client exited");
        match code {
            0 => Ok(Status::applied(0)),
            LDAP_ALREADY_EXISTS => Ok(Status::conflict(code)),
            LDAP_NO_SUCH_OBJECT => Ok(Status::not_found(code)),
            code if self.config.fatal_codes.contains(&code) => {
                Ok(Status::new(code, StatusClass::Fatal))
            }
            CLIENT_SERVER_DOWN | -1 => Err(TransportError::Connect(if stderr.is_empty() {
                "can't contact LDAP server".to_string()
            } else {
                stderr.to_string()
            })),
            code => Ok(Status::failed(code)),
        }
    }
}

#[async_trait]
impl TargetOperations for LdapCliTarget {
    fn name(&self) -> &str {
        "ldap"
    }

    async fn create(&self, record: &IdentityRecord) -> TargetResponse {
        let dn = self.dn(record);
        let input = ldif::add_entry(&dn, record, self.config.initial_password.as_deref());
        let cmd = self.command(&self.config.ldapadd);
        self.run(cmd, Some(input)).await
    }

    async fn update(&self, record: &IdentityRecord) -> TargetResponse {
        let dn = self.dn(record);
        let input = ldif::replace_description(&dn, &record.description);
        let cmd = self.command(&self.config.ldapmodify);
        self.run(cmd, Some(input)).await
    }

    async fn delete(&self, record: &IdentityRecord) -> TargetResponse {
        let mut cmd = self.command(&self.config.ldapdelete);
        cmd.arg(self.dn(record));
        self.run(cmd, None).await
    }
}
