//! Builder pattern for Orchestrator construction

use std::sync::Arc;
use std::time::Duration;

use crate::config::{CounterFailurePolicy, HarnessConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::traits::{BurstRunner, DownstreamCounter, NoopObserver, ResultSink, RunObserver};

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with proper configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .config(config)
///     .runner(engine)
///     .counter(counter)
///     .sink(artifact)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: HarnessConfig,
    runner: Option<Arc<dyn BurstRunner>>,
    counter: Option<Arc<dyn DownstreamCounter>>,
    sinks: Vec<Arc<dyn ResultSink>>,
    observer: Option<Arc<dyn RunObserver>>,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
            runner: None,
            counter: None,
            sinks: Vec::new(),
            observer: None,
        }
    }

    /// Set the full harness configuration
    pub fn config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of trials
    pub fn trials(mut self, count: usize) -> Self {
        self.config.trials.count = count;
        self
    }

    /// Set the burst size
    pub fn requests(mut self, requests: usize) -> Self {
        self.config.burst.requests = requests;
        self
    }

    /// Set the wait between a burst and the counter read
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.trials.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the downstream records written per successful request
    pub fn multiplier(mut self, multiplier: u32) -> Self {
        self.config.trials.multiplier = multiplier;
        self
    }

    /// Set how many times a failed counter read is retried
    pub fn counter_retries(mut self, retries: u32) -> Self {
        self.config.trials.counter_retries = retries;
        self
    }

    /// Set what happens once counter retries are exhausted
    pub fn on_counter_error(mut self, policy: CounterFailurePolicy) -> Self {
        self.config.trials.on_counter_error = policy;
        self
    }

    /// Set the burst runner
    pub fn runner(mut self, runner: Arc<dyn BurstRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Set the downstream counter
    pub fn counter(mut self, counter: Arc<dyn DownstreamCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Add a result sink
    pub fn sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Set the progress observer
    pub fn observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the runner or counter are not set, or if
    /// configuration validation fails.
    pub fn build(self) -> HarnessResult<Orchestrator> {
        let runner = self
            .runner
            .ok_or_else(|| HarnessError::missing_config("runner"))?;

        let counter = self
            .counter
            .ok_or_else(|| HarnessError::missing_config("counter"))?;

        self.config.validate()?;

        let observer = self.observer.unwrap_or_else(|| Arc::new(NoopObserver));

        Ok(Orchestrator::new(
            self.config,
            runner,
            counter,
            self.sinks,
            observer,
        ))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
