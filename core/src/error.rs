//! Error types for burst-bench-core

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::traits::{CounterError, SinkError};
use crate::trial::SeriesError;

/// Core error type
///
/// Per-request failures never appear here: they are absorbed into the
/// burst's failure tally. What remains is either trial-level (the
/// orchestrator skips the trial) or run-level (the run stops).
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A required builder field was not provided
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// The burst engine could not complete a burst
    #[error("burst failed: {0}")]
    Burst(String),

    /// The burst did not finish within its time bound
    #[error("burst timed out after {0:?}")]
    BurstTimeout(Duration),

    /// Downstream counter failure
    #[error("downstream counter error: {0}")]
    Counter(#[from] CounterError),

    /// Result persistence failure
    #[error("result sink error: {0}")]
    Sink(#[from] SinkError),

    /// A trial was recorded out of index order
    #[error("trial series error: {0}")]
    Series(#[from] SeriesError),
}

impl HarnessError {
    /// Configuration error with a message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// A builder was finalized without a required field
    pub fn missing_config(field: &'static str) -> Self {
        Self::MissingConfig(field)
    }

    /// Burst-level hard error
    pub fn burst(message: impl Into<String>) -> Self {
        Self::Burst(message.into())
    }

    /// Whether the orchestrator may skip the current trial and carry on.
    pub fn is_trial_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Burst(_) | Self::BurstTimeout(_) | Self::Counter(_)
        )
    }
}

impl From<ConfigError> for HarnessError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
