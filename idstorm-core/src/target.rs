//! Target operation port
//!
//! A target is anything that can create, update and delete identity records:
//! the SCIM-style HTTP endpoint, an LDAP directory, or the in-memory
//! simulator. Targets only report what happened; deciding whether that is a
//! success, an idempotent no-op or something worth retrying is the
//! classifier's job.

use crate::error::TransportError;
use crate::record::IdentityRecord;
use crate::types::OperationKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol-neutral meaning of an application-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// The requested mutation was applied
    Applied,
    /// The record already exists
    Conflict,
    /// The record does not exist
    NotFound,
    /// A status configured as permanent (e.g. rejected credentials)
    Fatal,
    /// Any other application-level error
    Failed,
}

/// An application-level answer from the target.
///
/// `code` is the raw protocol value (HTTP status, LDAP result code) kept for
/// logging; `class` is what the classifier looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code: i32,
    pub class: StatusClass,
}

impl Status {
    pub fn new(code: i32, class: StatusClass) -> Self {
        Self { code, class }
    }

    pub fn applied(code: i32) -> Self {
        Self::new(code, StatusClass::Applied)
    }

    pub fn conflict(code: i32) -> Self {
        Self::new(code, StatusClass::Conflict)
    }

    pub fn not_found(code: i32) -> Self {
        Self::new(code, StatusClass::NotFound)
    }

    pub fn failed(code: i32) -> Self {
        Self::new(code, StatusClass::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.code, self.class)
    }
}

/// What a single target call produced
pub type TargetResponse = Result<Status, TransportError>;

/// One capability per operation kind against the system under test
#[async_trait]
pub trait TargetOperations: Send + Sync {
    /// Short label used in logs and reports
    fn name(&self) -> &str;

    /// Provision a new record
    async fn create(&self, record: &IdentityRecord) -> TargetResponse;

    /// Modify an existing record
    async fn update(&self, record: &IdentityRecord) -> TargetResponse;

    /// Remove a record
    async fn delete(&self, record: &IdentityRecord) -> TargetResponse;

    /// Dispatch on the operation kind
    async fn apply(&self, kind: OperationKind, record: &IdentityRecord) -> TargetResponse {
        match kind {
            OperationKind::Create => self.create(record).await,
            OperationKind::Update => self.update(record).await,
            OperationKind::Delete => self.delete(record).await,
        }
    }
}
