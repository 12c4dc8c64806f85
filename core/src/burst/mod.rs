//! Burst engine: one fan-out of concurrent requests against a target
//!
//! A burst is the leaf of every trial. The engine dispatches exactly
//! `count` requests as independent tokio tasks sharing one
//! [`RequestTarget`](crate::traits::RequestTarget), tallies successes in an
//! atomic counter and returns only once every task has terminated:
//!
//! 1. Start the clock
//! 2. Spawn `count` workers, each gated by a semaphore permit
//! 3. Each worker issues one request and bumps the tally on success
//! 4. Join every worker (optionally under a whole-burst timeout)
//! 5. Stop the clock and report a [`BurstOutcome`]
//!
//! Failed requests are logged and counted, never retried, and never abort
//! the burst.
//!
//! # Example
//!
//! ```ignore
//! use burst_bench_core::burst::BurstEngineBuilder;
//!
//! let engine = BurstEngineBuilder::new()
//!     .target(target)
//!     .max_in_flight(Some(256))
//!     .build()?;
//!
//! let outcome = engine.run(1000).await?;
//! println!("{} of {} succeeded", outcome.succeeded, outcome.requested);
//! ```

mod builder;
mod executor;
mod stats;

pub use builder::BurstEngineBuilder;
pub use executor::BurstEngine;
pub use stats::BurstOutcome;

#[cfg(test)]
mod tests;
