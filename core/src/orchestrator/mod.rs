//! Orchestrator for the trial lifecycle
//!
//! The Orchestrator drives a run as a strict sequence of trials, each one
//! walking the same state machine:
//!
//! ```text
//! Idle -> { RunningBurst -> Settling -> ObservingAndResetting -> Recording } x T -> Done
//! ```
//!
//! - A burst hard error skips the trial (it never enters the series)
//! - Counter failures are retried, then skip the trial or abort the run
//! - Sink failures are fatal
//! - A shutdown signal interrupts any phase; the partial series is still
//!   handed to the sinks
//!
//! # Example
//!
//! ```ignore
//! use burst_bench_core::OrchestratorBuilder;
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .config(config)
//!     .runner(engine)
//!     .counter(counter)
//!     .sink(sink)
//!     .build()?;
//!
//! let report = orchestrator.run_with_signal_handling().await?;
//! ```

mod aggregator;
mod builder;
mod executor;
mod phase;

pub use aggregator::{summarize_series, RunReport, SeriesTotals, SkippedTrial};
pub use builder::OrchestratorBuilder;
pub use executor::Orchestrator;
pub use phase::TrialPhase;
