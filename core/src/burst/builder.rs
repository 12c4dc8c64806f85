//! Builder pattern for BurstEngine construction

use crate::error::{HarnessError, HarnessResult};
use crate::traits::{NoopObserver, RequestTarget, RunObserver};

use super::executor::BurstEngine;

use std::sync::Arc;
use std::time::Duration;

/// Builder for creating BurstEngine instances
///
/// # Example
/// ```ignore
/// let engine = BurstEngineBuilder::new()
///     .target(target)
///     .max_in_flight(Some(128))
///     .timeout(Some(Duration::from_secs(60)))
///     .build()?;
/// ```
pub struct BurstEngineBuilder {
    target: Option<Arc<dyn RequestTarget>>,
    max_in_flight: Option<usize>,
    timeout: Option<Duration>,
    observer: Option<Arc<dyn RunObserver>>,
}

impl BurstEngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            target: None,
            max_in_flight: None,
            timeout: None,
            observer: None,
        }
    }

    /// Set the request target
    pub fn target(mut self, target: Arc<dyn RequestTarget>) -> Self {
        self.target = Some(target);
        self
    }

    /// Cap concurrently running requests (None = the whole burst)
    pub fn max_in_flight(mut self, max: Option<usize>) -> Self {
        self.max_in_flight = max;
        self
    }

    /// Bound the whole burst (None = wait indefinitely)
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the progress observer
    pub fn observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the BurstEngine
    ///
    /// # Errors
    /// Returns an error if the target is missing or the in-flight cap is zero.
    pub fn build(self) -> HarnessResult<BurstEngine> {
        let target = self
            .target
            .ok_or(HarnessError::missing_config("target"))?;

        if self.max_in_flight == Some(0) {
            return Err(HarnessError::config("max_in_flight must be at least 1"));
        }

        let observer = self.observer.unwrap_or_else(|| Arc::new(NoopObserver));

        Ok(BurstEngine::new(
            target,
            self.max_in_flight,
            self.timeout,
            observer,
        ))
    }
}

impl Default for BurstEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
