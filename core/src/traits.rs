//! Collaborator traits for request targets, downstream counters, result
//! sinks and progress observers
//!
//! These traits are defined in core so that the HTTP, storage, report and
//! UI crates can implement them without depending on each other.

use std::time::Duration;

use async_trait::async_trait;

use crate::burst::BurstOutcome;
use crate::error::HarnessResult;
use crate::trial::{Trial, TrialSeries};

// ============================================================================
// Request Target
// ============================================================================

/// A single endpoint the burst engine hammers
///
/// Implementations must be safe to share across every worker in a burst;
/// the HTTP implementation shares one connection pool.
#[async_trait]
pub trait RequestTarget: Send + Sync {
    /// URL (or other identifier) of the target, for logging
    fn url(&self) -> &str;

    /// Issue one request.
    ///
    /// `Ok(())` means the request was built, sent, answered, and the answer
    /// was a success (HTTP 200 exactly). Everything else is an error.
    async fn fetch(&self, request_id: usize) -> Result<(), RequestError>;
}

/// Why a single request did not count as a success
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The request could not be constructed
    #[error("request construction failed: {0}")]
    Build(String),

    /// Transport-level failure (connect, TLS, reset, ...)
    #[error("request send failed: {0}")]
    Send(String),

    /// The transport gave up waiting for a response
    #[error("request timed out")]
    Timeout,

    /// A response arrived but its status was not 200
    #[error("non-200 status: {0}")]
    Status(u16),
}

// ============================================================================
// Burst Runner
// ============================================================================

/// Something that can run one burst of `count` concurrent requests
///
/// [`BurstEngine`](crate::burst::BurstEngine) is the production
/// implementation; the orchestrator only depends on this trait.
#[async_trait]
pub trait BurstRunner: Send + Sync {
    /// Run a burst and wait for every request to terminate.
    ///
    /// Individual request failures are reported through
    /// [`BurstOutcome::failed`]; an `Err` means the burst as a whole could
    /// not be completed and the trial must be abandoned.
    async fn run_burst(&self, count: usize) -> HarnessResult<BurstOutcome>;
}

// ============================================================================
// Downstream Counter
// ============================================================================

/// The external store whose row count reflects the burst's side effects
#[async_trait]
pub trait DownstreamCounter: Send + Sync {
    /// Backend identifier (e.g. "mysql", "sqlite")
    fn name(&self) -> &str;

    /// Read the current count and clear it, atomically.
    ///
    /// A record landing between the read and the clear must be neither
    /// dropped nor counted twice across successive calls.
    async fn read_and_reset(&self) -> Result<u64, CounterError>;
}

/// Downstream counter failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CounterError {
    /// Could not reach the store
    #[error("connection failed: {0}")]
    Connect(String),

    /// Could not open the transaction
    #[error("begin transaction failed: {0}")]
    Begin(String),

    /// The count query failed
    #[error("count query failed: {0}")]
    Read(String),

    /// Clearing the counted records failed
    #[error("clear failed: {0}")]
    Clear(String),

    /// The transaction could not be committed
    #[error("commit failed: {0}")]
    Commit(String),

    /// The round-trip exceeded its time bound
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

// ============================================================================
// Result Sink
// ============================================================================

/// Persistence collaborator for trial results
pub trait ResultSink: Send + Sync {
    /// Sink identifier for logging
    fn name(&self) -> &str;

    /// Called once per recorded trial, in index order.
    ///
    /// Sinks that only write the full series at the end keep the default.
    fn append_trial(&self, _trial: &Trial) -> Result<(), SinkError> {
        Ok(())
    }

    /// Persist the complete series at the end of a run
    fn persist(&self, series: &TrialSeries) -> Result<(), SinkError>;
}

/// Result persistence failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The artifact could not be opened or created
    #[error("cannot open {path}: {message}")]
    Open {
        /// Artifact path
        path: String,
        /// Underlying error
        message: String,
    },

    /// Writing the artifact failed
    #[error("write failed: {0}")]
    Write(String),

    /// Encoding the series failed
    #[error("encoding failed: {0}")]
    Encode(String),
}

// ============================================================================
// Run Observer
// ============================================================================

/// Progress hooks for UI rendering
///
/// Every method has a no-op default. Observers are pure side effects: the
/// engine and orchestrator never read anything back from them.
pub trait RunObserver: Send + Sync {
    /// A burst of `total` requests is about to be dispatched
    fn burst_started(&self, _trial: usize, _total: usize) {}

    /// One request in the current burst terminated
    fn request_finished(&self, _success: bool) {}

    /// Every request in the current burst terminated
    fn burst_finished(&self, _outcome: &BurstOutcome) {}

    /// The settle delay began
    fn settle_started(&self, _delay: Duration) {}

    /// The settle delay advanced; `elapsed` is cumulative
    fn settle_progress(&self, _elapsed: Duration) {}

    /// The settle delay ended
    fn settle_finished(&self) {}

    /// A trial was appended to the series
    fn trial_recorded(&self, _trial: &Trial) {}

    /// A trial was abandoned
    fn trial_skipped(&self, _trial: usize, _reason: &str) {}

    /// The run ended; called before any sink persists the series
    fn run_finished(&self, _series: &TrialSeries) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}
