//! Core domain model for idstorm
//!
//! This crate contains the types shared by every part of the harness: record
//! identifiers, operation kinds and outcomes, the ports through which the
//! harness reaches a target service or a network impairment controller, and
//! the outcome classifier that turns raw responses into retry decisions.

pub mod classify;
pub mod error;
pub mod impairment;
pub mod record;
pub mod target;
pub mod types;

// Re-export commonly used types at the crate root
pub use classify::classify;
pub use error::{HarnessError, TransportError};
pub use impairment::{ImpairmentController, ImpairmentScenario};
pub use record::{IdentityRecord, RecordTemplate};
pub use target::{Status, StatusClass, TargetOperations, TargetResponse};
pub use types::{OperationKind, OperationResult, Outcome, ParseError, RecordId};
