//! Console output for burst-bench runs
//!
//! This crate provides an indicatif-based `RunObserver` showing:
//!
//! - A request progress bar per burst
//! - A "Waiting..." bar during the settle delay
//! - A one-line summary per recorded trial
//! - The three result sequences at the end of the run

#![warn(missing_docs)]
#![warn(clippy::all)]

mod console;

pub use console::{format_failure_line, format_trial_line, ConsoleObserver};
