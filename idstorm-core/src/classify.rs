//! Outcome classification
//!
//! Collapsing "already in the desired end state" into a terminal outcome is
//! what makes a batch safe to restart from any point: a create that hits an
//! existing record and a delete that finds nothing are both done.

use crate::target::{StatusClass, TargetResponse};
use crate::types::{OperationKind, Outcome};

/// Map a raw target response to the four-way retry decision.
///
/// Transport failures are always retryable; only statuses the target marked
/// as [`StatusClass::Fatal`] stop retries for an id.
pub fn classify(kind: OperationKind, response: &TargetResponse) -> Outcome {
    let status = match response {
        Ok(status) => status,
        Err(_) => return Outcome::RetryableError,
    };

    match (kind, status.class) {
        (_, StatusClass::Fatal) => Outcome::FatalError,

        (OperationKind::Create, StatusClass::Applied) => Outcome::Success,
        (OperationKind::Create, StatusClass::Conflict) => Outcome::AlreadyDone,
        (OperationKind::Create, _) => Outcome::RetryableError,

        (OperationKind::Update, StatusClass::Applied) => Outcome::Success,
        (OperationKind::Update, _) => Outcome::RetryableError,

        (OperationKind::Delete, StatusClass::Applied | StatusClass::NotFound) => Outcome::Success,
        (OperationKind::Delete, _) => Outcome::RetryableError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::target::Status;

    #[test]
    fn test_create_mapping() {
        let create = OperationKind::Create;
        assert_eq!(classify(create, &Ok(Status::applied(201))), Outcome::Success);
        assert_eq!(classify(create, &Ok(Status::conflict(409))), Outcome::AlreadyDone);
        assert_eq!(classify(create, &Ok(Status::failed(500))), Outcome::RetryableError);
        assert_eq!(classify(create, &Ok(Status::not_found(404))), Outcome::RetryableError);
        assert_eq!(
            classify(
                create,
                &Err(TransportError::ConnectionRefused("127.0.0.1:5000".into()))
            ),
            Outcome::RetryableError
        );
    }

    #[test]
    fn test_update_mapping() {
        let update = OperationKind::Update;
        assert_eq!(classify(update, &Ok(Status::applied(200))), Outcome::Success);
        assert_eq!(classify(update, &Ok(Status::not_found(404))), Outcome::RetryableError);
        assert_eq!(classify(update, &Ok(Status::conflict(409))), Outcome::RetryableError);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let delete = OperationKind::Delete;
        assert_eq!(classify(delete, &Ok(Status::applied(204))), Outcome::Success);
        assert_eq!(classify(delete, &Ok(Status::not_found(404))), Outcome::Success);
        assert_eq!(classify(delete, &Ok(Status::failed(503))), Outcome::RetryableError);
    }

    #[test]
    fn test_transport_errors_never_fatal() {
        let failures = [
            TransportError::Timeout(5000),
            TransportError::Tls("handshake".into()),
            TransportError::Connect("reset".into()),
            TransportError::Aborted("panic".into()),
        ];
        for kind in OperationKind::all() {
            for failure in &failures {
                assert_eq!(classify(*kind, &Err(failure.clone())), Outcome::RetryableError);
            }
        }
    }

    #[test]
    fn test_fatal_status_is_terminal_for_every_kind() {
        let status = Status::new(401, StatusClass::Fatal);
        for kind in OperationKind::all() {
            assert_eq!(classify(*kind, &Ok(status)), Outcome::FatalError);
        }
    }
}
