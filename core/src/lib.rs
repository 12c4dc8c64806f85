//! burst-bench-core: Core engine for repeated load-measurement runs
//!
//! This crate provides the pieces every burst-bench component builds on:
//!
//! - The burst engine (concurrent fan-out with an exact success tally)
//! - The trial orchestrator (burst, settle, observe-and-reset, record)
//! - Trial records and the three-sequence result series
//! - Collaborator traits (RequestTarget, DownstreamCounter, ResultSink, RunObserver)
//! - Configuration and error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod burst;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod traits;
pub mod trial;

pub use burst::{BurstEngine, BurstEngineBuilder, BurstOutcome};
pub use config::*;
pub use error::*;
pub use orchestrator::{
    summarize_series, Orchestrator, OrchestratorBuilder, RunReport, SeriesTotals, SkippedTrial,
    TrialPhase,
};
pub use traits::*;
pub use trial::*;
