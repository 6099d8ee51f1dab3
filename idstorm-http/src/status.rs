//! HTTP status interpretation

use idstorm_core::{OperationKind, Status, StatusClass};

/// Maps HTTP statuses to protocol-neutral classes for each operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMap {
    conflict: Vec<u16>,
    fatal: Vec<u16>,
}

impl StatusMap {
    pub fn new(conflict: Vec<u16>, fatal: Vec<u16>) -> Self {
        Self { conflict, fatal }
    }

    pub fn classify(&self, kind: OperationKind, code: u16) -> Status {
        let class = if self.fatal.contains(&code) {
            StatusClass::Fatal
        } else if self.conflict.contains(&code) {
            StatusClass::Conflict
        } else if code == 404 {
            StatusClass::NotFound
        } else {
            match (kind, code) {
                (OperationKind::Create, 201) => StatusClass::Applied,
                (OperationKind::Update | OperationKind::Delete, 200 | 204) => StatusClass::Applied,
                _ => StatusClass::Failed,
            }
        };
        Status::new(i32::from(code), class)
    }
}

impl Default for StatusMap {
    fn default() -> Self {
        Self::new(vec![409], Vec::new())
    }
}
