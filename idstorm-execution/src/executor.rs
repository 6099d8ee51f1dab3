//! Single-operation execution

use idstorm_core::{
    classify, OperationKind, OperationResult, RecordId, RecordTemplate, TargetOperations,
    TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Issues one operation for one record id and classifies what came back.
///
/// Never fails: a call that exceeds the per-call timeout is dropped (closing
/// its connection) and reported as a transport timeout.
pub struct OperationExecutor {
    target: Arc<dyn TargetOperations>,
    kind: OperationKind,
    template: RecordTemplate,
    timeout: Duration,
}

impl OperationExecutor {
    pub fn new(
        target: Arc<dyn TargetOperations>,
        kind: OperationKind,
        template: RecordTemplate,
        timeout: Duration,
    ) -> Self {
        Self {
            target,
            kind,
            template,
            timeout,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute the run's operation for `id`
    pub async fn execute(&self, id: RecordId) -> OperationResult {
        let record = self.template.render(id, self.kind);

        let response = match tokio::time::timeout(self.timeout, self.target.apply(self.kind, &record)).await {
            Ok(response) => response,
            Err(_) => Err(TransportError::Timeout(self.timeout.as_millis() as u64)),
        };

        let outcome = classify(self.kind, &response);
        match &response {
            Ok(status) => trace!(record = %id, uid = %record.uid, %status, %outcome, "Operation completed"),
            Err(e) => debug!(record = %id, uid = %record.uid, error = %e, %outcome, "Operation failed"),
        }

        OperationResult::new(id, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use idstorm_core::{IdentityRecord, Outcome, Status, TargetResponse};

    struct SlowTarget;

    #[async_trait]
    impl TargetOperations for SlowTarget {
        fn name(&self) -> &str {
            "slow"
        }

        async fn create(&self, _record: &IdentityRecord) -> TargetResponse {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Status::applied(201))
        }

        async fn update(&self, _record: &IdentityRecord) -> TargetResponse {
            Ok(Status::not_found(404))
        }

        async fn delete(&self, _record: &IdentityRecord) -> TargetResponse {
            Ok(Status::not_found(404))
        }
    }

    fn executor(kind: OperationKind) -> OperationExecutor {
        OperationExecutor::new(
            Arc::new(SlowTarget),
            kind,
            RecordTemplate::default(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retryable() {
        let result = executor(OperationKind::Create).execute(RecordId::new(1)).await;
        assert_eq!(result.record_id, RecordId::new(1));
        assert_eq!(result.outcome, Outcome::RetryableError);
    }

    #[tokio::test]
    async fn test_status_goes_through_classifier() {
        let update = executor(OperationKind::Update).execute(RecordId::new(3)).await;
        assert_eq!(update.outcome, Outcome::RetryableError);

        let delete = executor(OperationKind::Delete).execute(RecordId::new(3)).await;
        assert_eq!(delete.outcome, Outcome::Success);
    }
}
