//! LDAP target error types

use thiserror::Error;

/// Problems found while preparing the LDAP target
#[derive(Debug, Error)]
pub enum LdapError {
    #[error("LDAP client tool '{0}' not found on PATH (install the OpenLDAP client utilities)")]
    ToolNotFound(String),

    #[error("Invalid LDAP URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to write the bind password file: {0}")]
    PasswordFile(#[source] std::io::Error),
}

impl From<LdapError> for idstorm_core::HarnessError {
    fn from(err: LdapError) -> Self {
        idstorm_core::HarnessError::Configuration(err.to_string())
    }
}
