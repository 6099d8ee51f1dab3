//! Core type definitions for idstorm

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of one logical identity record.
///
/// The universe of a run is the contiguous range `[1, N]`; an id is stable
/// across rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Create a record id. Ids start at 1.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of the id
    pub fn get(self) -> u64 {
        self.0
    }

    /// All ids of a run with `total` records, in ascending order
    pub fn universe(total: u64) -> impl Iterator<Item = RecordId> {
        (1..=total).map(RecordId)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The mutation applied to every record of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    /// Get the string representation of the operation kind
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    /// Get all operation kinds
    pub fn all() -> &'static [OperationKind] {
        &[
            OperationKind::Create,
            OperationKind::Update,
            OperationKind::Delete,
        ]
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" | "insert" | "add" => Ok(OperationKind::Create),
            "update" | "modify" => Ok(OperationKind::Update),
            "delete" | "remove" => Ok(OperationKind::Delete),
            _ => Err(ParseError::InvalidOperationKind(s.to_string())),
        }
    }
}

/// Classified result of one operation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The requested mutation was applied
    Success,
    /// The record was already in the desired end state
    AlreadyDone,
    /// Transient failure, the id goes back into the pending set
    RetryableError,
    /// Permanent failure, the id is not retried
    FatalError,
}

impl Outcome {
    /// Whether the id leaves the pending set with this outcome
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::RetryableError)
    }

    /// Whether the record reached its desired end state
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::AlreadyDone)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Success => "SUCCESS",
            Outcome::AlreadyDone => "ALREADY_DONE",
            Outcome::RetryableError => "RETRYABLE_ERROR",
            Outcome::FatalError => "FATAL_ERROR",
        };
        f.write_str(label)
    }
}

/// One classified attempt for one record in one round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationResult {
    pub record_id: RecordId,
    pub outcome: Outcome,
}

impl OperationResult {
    pub fn new(record_id: RecordId, outcome: Outcome) -> Self {
        Self { record_id, outcome }
    }
}

/// Errors that can occur when parsing core types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid operation kind: '{0}'. Supported kinds are: insert, update, delete")]
    InvalidOperationKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_from_str() {
        assert_eq!("insert".parse::<OperationKind>().unwrap(), OperationKind::Create);
        assert_eq!("CREATE".parse::<OperationKind>().unwrap(), OperationKind::Create);
        assert_eq!("modify".parse::<OperationKind>().unwrap(), OperationKind::Update);
        assert_eq!("Delete".parse::<OperationKind>().unwrap(), OperationKind::Delete);

        assert!("upsert".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_universe_is_contiguous_from_one() {
        let ids: Vec<u64> = RecordId::universe(4).map(RecordId::get).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(RecordId::universe(0).count(), 0);
    }

    #[test]
    fn test_outcome_terminality() {
        assert!(Outcome::Success.is_terminal());
        assert!(Outcome::AlreadyDone.is_terminal());
        assert!(Outcome::FatalError.is_terminal());
        assert!(!Outcome::RetryableError.is_terminal());

        assert!(Outcome::AlreadyDone.is_satisfied());
        assert!(!Outcome::FatalError.is_satisfied());
    }

    #[test]
    fn test_outcome_serializes_screaming_case() {
        let json = serde_json::to_string(&Outcome::AlreadyDone).unwrap();
        assert_eq!(json, "\"ALREADY_DONE\"");
    }
}
