//! Deterministic identity records derived from a record id

use crate::types::{OperationKind, RecordId};
use serde::Serialize;

/// First POSIX uid number handed out; record `n` gets `BASE_UID_NUMBER + n`
pub const BASE_UID_NUMBER: u64 = 10_000;

/// Group id shared by every generated account
pub const DEFAULT_GID_NUMBER: u64 = 500;

/// The attributes of one generated identity.
///
/// Every field is a pure function of the record id, the operation kind and
/// the run's template, so a retried request is byte-identical to the first
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityRecord {
    pub id: RecordId,
    pub uid: String,
    pub display_name: String,
    pub surname: String,
    pub uid_number: u64,
    pub gid_number: u64,
    pub home_directory: String,
    pub description: String,
}

/// Builds [`IdentityRecord`]s for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTemplate {
    uid_prefix: String,
    run_stamp: String,
}

impl RecordTemplate {
    /// Create a template.
    ///
    /// `run_stamp` is fixed once per run and ends up in update descriptions.
    pub fn new(uid_prefix: impl Into<String>, run_stamp: impl Into<String>) -> Self {
        Self {
            uid_prefix: uid_prefix.into(),
            run_stamp: run_stamp.into(),
        }
    }

    pub fn uid_prefix(&self) -> &str {
        &self.uid_prefix
    }

    pub fn run_stamp(&self) -> &str {
        &self.run_stamp
    }

    /// Uid for a record id, e.g. `user42`
    pub fn uid(&self, id: RecordId) -> String {
        format!("{}{}", self.uid_prefix, id)
    }

    /// Render the record sent for `kind`
    pub fn render(&self, id: RecordId, kind: OperationKind) -> IdentityRecord {
        let uid = self.uid(id);
        let description = match kind {
            OperationKind::Create => "Initial provisioning load".to_string(),
            OperationKind::Update => format!("Modified at {} (persistent round)", self.run_stamp),
            OperationKind::Delete => String::new(),
        };

        IdentityRecord {
            id,
            display_name: format!("Test User {}", id),
            surname: "Load Family".to_string(),
            uid_number: BASE_UID_NUMBER + id.get(),
            gid_number: DEFAULT_GID_NUMBER,
            home_directory: format!("/home/{}", uid),
            uid,
            description,
        }
    }
}

impl Default for RecordTemplate {
    fn default() -> Self {
        Self::new("user", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_deterministic() {
        let template = RecordTemplate::new("user", "12:00:00");
        let first = template.render(RecordId::new(7), OperationKind::Update);
        let second = template.render(RecordId::new(7), OperationKind::Update);
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_derives_attributes_from_id() {
        let template = RecordTemplate::new("user_ldap_", "stamp");
        let record = template.render(RecordId::new(42), OperationKind::Create);

        assert_eq!(record.uid, "user_ldap_42");
        assert_eq!(record.display_name, "Test User 42");
        assert_eq!(record.uid_number, 10_042);
        assert_eq!(record.home_directory, "/home/user_ldap_42");
    }

    #[test]
    fn test_update_description_carries_run_stamp() {
        let template = RecordTemplate::new("user", "09:15:30");
        let record = template.render(RecordId::new(1), OperationKind::Update);
        assert!(record.description.contains("09:15:30"));
    }
}
