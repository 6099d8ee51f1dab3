//! LDAP directory target for idstorm
//!
//! Each operation runs one OpenLDAP client (`ldapadd`, `ldapmodify`,
//! `ldapdelete`); the LDAP result code comes back as the client's exit
//! status.

pub mod client;
pub mod errors;
pub mod ldif;
pub mod tools;

pub use client::LdapCliTarget;
pub use errors::LdapError;
pub use tools::{check_tools, find_in_path};
