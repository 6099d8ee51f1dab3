//! Bounded concurrency pool
//!
//! A round is a full barrier: `run_round` returns only after every dispatched
//! operation has produced its result.

use futures::FutureExt;
use idstorm_core::{OperationResult, Outcome, RecordId};
use idstorm_resilience::ShutdownListener;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// What one round produced
#[derive(Debug, Default)]
pub struct RoundResults {
    /// Exactly one result per dispatched id
    pub results: Vec<OperationResult>,

    /// Ids never dispatched because the run was cancelled
    pub skipped: Vec<RecordId>,
}

impl RoundResults {
    pub fn len(&self) -> usize {
        self.results.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `execute` once per pending id with at most `limit` in flight.
///
/// Excess ids wait for a permit. Once `cancel` fires no further id is
/// dispatched; in-flight operations are allowed to finish. A panicking
/// operation is reported as a retryable outcome for its id.
pub async fn run_round<F, Fut>(
    pending: &[RecordId],
    execute: F,
    limit: usize,
    cancel: &mut ShutdownListener,
) -> RoundResults
where
    F: Fn(RecordId) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = OperationResult> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();
    let mut outstanding: HashSet<RecordId> = HashSet::with_capacity(pending.len());
    let mut round = RoundResults {
        results: Vec::with_capacity(pending.len()),
        skipped: Vec::new(),
    };

    for &id in pending {
        if cancel.is_cancelled() {
            round.skipped.push(id);
            continue;
        }

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                round.skipped.push(id);
                continue;
            }
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    round.skipped.push(id);
                    continue;
                }
            },
        };

        outstanding.insert(id);
        let execute = execute.clone();
        tasks.spawn(async move {
            let _permit = permit;
            match AssertUnwindSafe(execute(id)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    warn!(record = %id, "Operation panicked, will retry");
                    OperationResult::new(id, Outcome::RetryableError)
                }
            }
        });
    }

    if !round.skipped.is_empty() {
        debug!(skipped = round.skipped.len(), "Dispatch stopped by cancellation");
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => {
                if outstanding.remove(&result.record_id) {
                    round.results.push(result);
                } else {
                    warn!(record = %result.record_id, "Dropping unexpected result");
                }
            }
            Err(e) => warn!("Operation task failed: {}", e),
        }
    }

    // Tasks that ended without reporting keep their id pending
    for id in outstanding {
        round
            .results
            .push(OperationResult::new(id, Outcome::RetryableError));
    }

    round
}

#[cfg(test)]
mod tests {
    use super::*;
    use idstorm_resilience::ShutdownCoordinator;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ids(n: u64) -> Vec<RecordId> {
        RecordId::universe(n).collect()
    }

    #[tokio::test]
    async fn test_one_result_per_id() {
        let pending = ids(25);
        let round = run_round(
            &pending,
            |id| async move { OperationResult::new(id, Outcome::Success) },
            4,
            &mut ShutdownListener::never(),
        )
        .await;

        assert_eq!(round.results.len(), 25);
        assert!(round.skipped.is_empty());
        let mut seen: Vec<_> = round.results.iter().map(|r| r.record_id).collect();
        seen.sort();
        assert_eq!(seen, pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let execute = {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            move |id| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    OperationResult::new(id, Outcome::Success)
                }
            }
        };

        let round = run_round(&ids(40), execute, 3, &mut ShutdownListener::never()).await;

        assert_eq!(round.results.len(), 40);
        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_becomes_retryable() {
        let round = run_round(
            &ids(5),
            |id: RecordId| async move {
                if id.get() == 3 {
                    panic!("target blew up");
                }
                OperationResult::new(id, Outcome::Success)
            },
            2,
            &mut ShutdownListener::never(),
        )
        .await;

        assert_eq!(round.results.len(), 5);
        let failed: Vec<_> = round
            .results
            .iter()
            .filter(|r| r.outcome == Outcome::RetryableError)
            .map(|r| r.record_id)
            .collect();
        assert_eq!(failed, vec![RecordId::new(3)]);
    }

    #[tokio::test]
    async fn test_cancelled_round_dispatches_nothing() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.shutdown().unwrap();
        let mut listener = coordinator.subscribe();

        let round = run_round(
            &ids(10),
            |id| async move { OperationResult::new(id, Outcome::Success) },
            4,
            &mut listener,
        )
        .await;

        assert!(round.results.is_empty());
        assert_eq!(round.skipped.len(), 10);
        assert_eq!(round.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_mid_round_keeps_completeness() {
        let coordinator = ShutdownCoordinator::new();
        let mut listener = coordinator.subscribe();

        let execute = {
            let coordinator = coordinator.clone();
            move |id: RecordId| {
                let coordinator = coordinator.clone();
                async move {
                    if id.get() == 2 {
                        let _ = coordinator.shutdown();
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    OperationResult::new(id, Outcome::Success)
                }
            }
        };

        let round = run_round(&ids(20), execute, 2, &mut listener).await;

        assert_eq!(round.len(), 20);
        assert!(!round.skipped.is_empty());
        assert!(round.results.len() >= 2);
    }
}
