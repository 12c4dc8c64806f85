//! Burst execution

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::error::{HarnessError, HarnessResult};
use crate::traits::{BurstRunner, RequestTarget, RunObserver};

use super::stats::BurstOutcome;

/// Engine that fans a burst out over a shared request target
///
/// Workers are plain tokio tasks held in a `JoinSet`. Dropping the future
/// returned by [`BurstEngine::run`] drops the set and aborts any worker
/// still running, which is how cancellation and the burst timeout stop a
/// burst early.
pub struct BurstEngine {
    /// Target shared by every worker
    target: Arc<dyn RequestTarget>,

    /// Cap on concurrently running requests
    max_in_flight: Option<usize>,

    /// Bound on the whole burst
    timeout: Option<Duration>,

    /// Progress hooks
    observer: Arc<dyn RunObserver>,
}

impl BurstEngine {
    /// Create a new engine
    ///
    /// Use `BurstEngineBuilder` for a more ergonomic construction.
    pub fn new(
        target: Arc<dyn RequestTarget>,
        max_in_flight: Option<usize>,
        timeout: Option<Duration>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            target,
            max_in_flight,
            timeout,
            observer,
        }
    }

    /// Dispatch `count` concurrent requests and wait for all of them.
    ///
    /// Returns an error only when the burst as a whole fails (timeout or a
    /// broken join); individual request failures land in
    /// [`BurstOutcome::failed`].
    pub async fn run(&self, count: usize) -> HarnessResult<BurstOutcome> {
        if count == 0 {
            return Ok(BurstOutcome::empty());
        }

        let permits = self.max_in_flight.unwrap_or(count).clamp(1, count);
        let semaphore = Arc::new(Semaphore::new(permits));
        let succeeded = Arc::new(AtomicUsize::new(0));
        let mut workers = JoinSet::new();

        tracing::debug!(
            target_url = self.target.url(),
            count,
            max_in_flight = permits,
            "Dispatching burst"
        );

        let start = Instant::now();

        for request_id in 0..count {
            let target = Arc::clone(&self.target);
            let semaphore = Arc::clone(&semaphore);
            let succeeded = Arc::clone(&succeeded);
            let observer = Arc::clone(&self.observer);

            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    observer.request_finished(false);
                    return;
                };

                match target.fetch(request_id).await {
                    Ok(()) => {
                        succeeded.fetch_add(1, Ordering::SeqCst);
                        observer.request_finished(true);
                    }
                    Err(e) => {
                        tracing::debug!(request_id, error = %e, "Request failed");
                        observer.request_finished(false);
                    }
                }
            });
        }

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, join_workers(&mut workers, self.observer.as_ref())).await {
                Ok(joined) => joined,
                Err(_) => {
                    workers.abort_all();
                    tracing::warn!(
                        count,
                        timeout_ms = limit.as_millis() as u64,
                        "Burst exceeded its time bound, outstanding requests aborted"
                    );
                    return Err(HarnessError::BurstTimeout(limit));
                }
            },
            None => join_workers(&mut workers, self.observer.as_ref()).await,
        };

        let elapsed = start.elapsed();

        if joined != count {
            return Err(HarnessError::burst(format!(
                "joined {joined} of {count} workers"
            )));
        }

        let succeeded = succeeded.load(Ordering::SeqCst);
        let outcome = BurstOutcome {
            requested: count,
            succeeded,
            failed: count - succeeded,
            elapsed,
        };

        if outcome.failed > 0 {
            tracing::warn!(
                failed = outcome.failed,
                requested = count,
                "Some requests in the burst failed"
            );
        }

        tracing::debug!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            elapsed_ms = elapsed.as_millis() as u64,
            rps = outcome.requests_per_second(),
            "Burst completed"
        );

        Ok(outcome)
    }

    /// Get the target URL
    pub fn target_url(&self) -> &str {
        self.target.url()
    }

    /// Get the in-flight cap
    pub fn max_in_flight(&self) -> Option<usize> {
        self.max_in_flight
    }
}

/// Join every worker, returning how many terminated.
///
/// A panicking worker never reached its tally or the observer, so it is
/// reported to the observer here as a failure.
async fn join_workers(workers: &mut JoinSet<()>, observer: &dyn RunObserver) -> usize {
    let mut joined = 0;
    while let Some(result) = workers.join_next().await {
        joined += 1;
        if let Err(e) = result {
            tracing::error!(error = %e, "Burst worker panicked");
            observer.request_finished(false);
        }
    }
    joined
}

#[async_trait]
impl BurstRunner for BurstEngine {
    async fn run_burst(&self, count: usize) -> HarnessResult<BurstOutcome> {
        self.run(count).await
    }
}

impl std::fmt::Debug for BurstEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BurstEngine")
            .field("target", &self.target.url())
            .field("max_in_flight", &self.max_in_flight)
            .field("timeout", &self.timeout)
            .finish()
    }
}
