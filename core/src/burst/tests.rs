//! Integration tests for the burst engine

use super::*;
use crate::error::HarnessError;
use crate::traits::{RequestError, RequestTarget, RunObserver};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Mock RequestTarget
// ============================================================================

struct MockTarget {
    url: String,
    delay: Option<Duration>,
    status: u16,
    fail_every: Option<usize>,
    panic_on: Option<usize>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTarget {
    fn new() -> Self {
        Self {
            url: "http://mock.local/test.html".to_string(),
            delay: None,
            status: 200,
            fail_every: None,
            panic_on: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Fail every request whose id is a multiple of `n`
    fn with_fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    fn with_panic_on(mut self, request_id: usize) -> Self {
        self.panic_on = Some(request_id);
        self
    }
}

#[async_trait]
impl RequestTarget for MockTarget {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self, request_id: usize) -> Result<(), RequestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_on == Some(request_id) {
            panic!("simulated worker panic");
        }

        if let Some(n) = self.fail_every {
            if request_id % n == 0 {
                return Err(RequestError::Send("connection reset".to_string()));
            }
        }

        if self.status != 200 {
            return Err(RequestError::Status(self.status));
        }

        Ok(())
    }
}

// ============================================================================
// Mock Observer
// ============================================================================

#[derive(Default)]
struct CountingObserver {
    ok: AtomicUsize,
    failed: AtomicUsize,
}

impl RunObserver for CountingObserver {
    fn request_finished(&self, success: bool) {
        if success {
            self.ok.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn engine(target: Arc<MockTarget>) -> BurstEngine {
    BurstEngineBuilder::new()
        .target(target)
        .build()
        .expect("Failed to build engine")
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_burst_all_success() {
    for count in [0, 1, 7, 100] {
        let target = Arc::new(MockTarget::new());
        let outcome = engine(Arc::clone(&target)).run(count).await.unwrap();

        assert_eq!(outcome.requested, count);
        assert_eq!(outcome.succeeded, count);
        assert_eq!(outcome.failed, 0);
        assert_eq!(target.calls.load(Ordering::SeqCst), count);
    }
}

#[tokio::test]
async fn test_burst_all_server_errors() {
    let target = Arc::new(MockTarget::new().with_status(500));
    let outcome = engine(Arc::clone(&target)).run(50).await.unwrap();

    assert_eq!(outcome.succeeded, 0);
    assert_eq!(outcome.failed, 50);
    assert!(outcome.is_complete());
}

#[tokio::test]
async fn test_burst_accounts_for_every_request() {
    let target = Arc::new(
        MockTarget::new()
            .with_fail_every(3)
            .with_delay(Duration::from_millis(1)),
    );
    let outcome = engine(Arc::clone(&target)).run(10).await.unwrap();

    // ids 0, 3, 6, 9 fail
    assert_eq!(outcome.succeeded, 6);
    assert_eq!(outcome.failed, 4);
    assert_eq!(outcome.completed(), 10);
    assert_eq!(target.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_burst_tally_is_exact_across_runs() {
    let target = Arc::new(MockTarget::new().with_fail_every(7));
    let engine = engine(target);

    let mut seen = Vec::new();
    for _ in 0..10 {
        let outcome = engine.run(500).await.unwrap();
        assert!(outcome.is_complete());
        seen.push(outcome.succeeded);
    }

    // 500 ids, multiples of 7 in 0..500 = 72
    assert!(seen.iter().all(|&s| s == 428), "tallies differ: {seen:?}");
}

#[tokio::test]
async fn test_burst_respects_max_in_flight() {
    let target = Arc::new(MockTarget::new().with_delay(Duration::from_millis(5)));
    let engine = BurstEngineBuilder::new()
        .target(Arc::clone(&target) as Arc<dyn RequestTarget>)
        .max_in_flight(Some(3))
        .build()
        .unwrap();

    let outcome = engine.run(20).await.unwrap();

    assert_eq!(outcome.succeeded, 20);
    assert!(target.max_in_flight.load(Ordering::SeqCst) <= 3);
}

#[tokio::test(start_paused = true)]
async fn test_burst_unbounded_runs_all_concurrently() {
    let target = Arc::new(MockTarget::new().with_delay(Duration::from_millis(100)));
    let outcome = engine(Arc::clone(&target)).run(50).await.unwrap();

    assert_eq!(target.max_in_flight.load(Ordering::SeqCst), 50);
    // All 50 overlap, so the burst takes one latency, not fifty
    assert!(outcome.elapsed >= Duration::from_millis(100));
    assert!(outcome.elapsed < Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_burst_elapsed_grows_with_count() {
    let target = Arc::new(MockTarget::new().with_delay(Duration::from_millis(10)));
    let engine = BurstEngineBuilder::new()
        .target(target)
        .max_in_flight(Some(4))
        .build()
        .unwrap();

    let mut previous = Duration::ZERO;
    for count in [1, 4, 8, 16, 32] {
        let outcome = engine.run(count).await.unwrap();
        assert!(
            outcome.elapsed >= previous,
            "elapsed shrank at count {count}: {:?} < {previous:?}",
            outcome.elapsed
        );
        previous = outcome.elapsed;
    }

    // 32 requests, 4 at a time, 10ms each
    assert!(previous >= Duration::from_millis(80));
}

#[tokio::test(start_paused = true)]
async fn test_burst_timeout_is_hard_error() {
    let target = Arc::new(MockTarget::new().with_delay(Duration::from_secs(3600)));
    let engine = BurstEngineBuilder::new()
        .target(target)
        .timeout(Some(Duration::from_millis(50)))
        .build()
        .unwrap();

    let err = engine.run(5).await.unwrap_err();
    assert!(matches!(err, HarnessError::BurstTimeout(d) if d == Duration::from_millis(50)));
    assert!(err.is_trial_recoverable());
}

#[tokio::test]
async fn test_burst_panicking_worker_counts_as_failure() {
    let target = Arc::new(MockTarget::new().with_panic_on(2));
    let outcome = engine(target).run(5).await.unwrap();

    assert_eq!(outcome.succeeded, 4);
    assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn test_burst_notifies_observer_per_request() {
    let target = Arc::new(MockTarget::new().with_fail_every(2));
    let observer = Arc::new(CountingObserver::default());
    let engine = BurstEngineBuilder::new()
        .target(target)
        .observer(Arc::clone(&observer) as Arc<dyn RunObserver>)
        .build()
        .unwrap();

    let outcome = engine.run(9).await.unwrap();

    assert_eq!(observer.ok.load(Ordering::SeqCst), outcome.succeeded);
    assert_eq!(observer.failed.load(Ordering::SeqCst), outcome.failed);
    assert_eq!(outcome.failed, 5); // ids 0, 2, 4, 6, 8
}

#[tokio::test]
async fn test_burst_reports_panicking_worker_to_observer() {
    let target = Arc::new(MockTarget::new().with_panic_on(2));
    let observer = Arc::new(CountingObserver::default());
    let engine = BurstEngineBuilder::new()
        .target(target)
        .observer(Arc::clone(&observer) as Arc<dyn RunObserver>)
        .build()
        .unwrap();

    let outcome = engine.run(5).await.unwrap();

    assert_eq!(outcome.failed, 1);
    assert_eq!(observer.ok.load(Ordering::SeqCst), 4);
    assert_eq!(observer.failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_burst_runner_trait_delegates() {
    use crate::traits::BurstRunner;

    let runner: Arc<dyn BurstRunner> = Arc::new(engine(Arc::new(MockTarget::new())));
    let outcome = runner.run_burst(12).await.unwrap();
    assert_eq!(outcome.succeeded, 12);
}

#[test]
fn test_burst_engine_debug_format() {
    let engine = BurstEngineBuilder::new()
        .target(Arc::new(MockTarget::new()))
        .max_in_flight(Some(8))
        .build()
        .unwrap();

    let debug = format!("{:?}", engine);
    assert!(debug.contains("BurstEngine"));
    assert!(debug.contains("mock.local"));
    assert!(debug.contains("8"));
}

#[test]
fn test_builder_rejects_zero_in_flight() {
    let result = BurstEngineBuilder::new()
        .target(Arc::new(MockTarget::new()))
        .max_in_flight(Some(0))
        .build();

    assert!(matches!(result, Err(HarnessError::Config(_))));
}
