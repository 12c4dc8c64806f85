//! Orchestrator execution logic

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::{CounterFailurePolicy, HarnessConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::traits::{BurstRunner, CounterError, DownstreamCounter, ResultSink, RunObserver};
use crate::trial::{Trial, TrialSeries};

use super::aggregator::{summarize_series, RunReport, SkippedTrial};
use super::phase::TrialPhase;

/// Interval between settle progress notifications
const SETTLE_TICK: Duration = Duration::from_millis(100);

/// How a single trial ended when it did not produce a record
enum TrialFailure {
    /// Leave the trial out and continue with the next one
    Skip {
        phase: TrialPhase,
        error: HarnessError,
    },
    /// Stop the run with this error
    Abort(HarnessError),
    /// Shutdown was requested
    Cancelled,
}

/// Orchestrator manages the trial lifecycle
///
/// Trials never overlap: each one must observe a counter that only its own
/// burst has touched.
pub struct Orchestrator {
    /// Harness configuration
    pub(crate) config: HarnessConfig,

    /// Burst engine
    pub(crate) runner: Arc<dyn BurstRunner>,

    /// Downstream counter
    pub(crate) counter: Arc<dyn DownstreamCounter>,

    /// Result sinks, fed in order
    pub(crate) sinks: Vec<Arc<dyn ResultSink>>,

    /// Progress hooks
    pub(crate) observer: Arc<dyn RunObserver>,

    /// Shutdown signal sender
    pub(crate) shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Use `OrchestratorBuilder` for a more ergonomic construction.
    pub fn new(
        config: HarnessConfig,
        runner: Arc<dyn BurstRunner>,
        counter: Arc<dyn DownstreamCounter>,
        sinks: Vec<Arc<dyn ResultSink>>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            runner,
            counter,
            sinks,
            observer,
            shutdown_tx,
        }
    }

    /// Trigger shutdown of the current run
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get the harness configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run every configured trial, then hand the series to the sinks.
    ///
    /// # Errors
    ///
    /// Fails when a sink cannot record the results, when a trial error is
    /// not recoverable, or when the counter fails under the `abort` policy.
    /// Skipped trials and cancellation are reported in the [`RunReport`].
    pub async fn run(&self) -> HarnessResult<RunReport> {
        let start = Instant::now();
        let mut shutdown = self.shutdown_tx.subscribe();
        let planned = self.config.trials.count;

        let mut series = TrialSeries::new();
        let mut skipped = Vec::new();
        let mut cancelled = false;

        tracing::info!(
            target_url = %self.config.target.url,
            trials = planned,
            requests = self.config.burst.requests,
            settle_delay_ms = self.config.trials.settle_delay_ms,
            multiplier = self.config.trials.multiplier,
            counter = self.counter.name(),
            "Starting run"
        );

        for index in 1..=planned {
            let span = tracing::info_span!("trial", index);
            match self.run_trial(index, &mut shutdown).instrument(span).await {
                Ok(trial) => self.record(&mut series, trial)?,
                Err(TrialFailure::Skip { phase, error }) => {
                    tracing::warn!(trial = index, phase = %phase, error = %error, "Trial skipped");
                    let reason = error.to_string();
                    self.observer.trial_skipped(index, &reason);
                    skipped.push(SkippedTrial {
                        index,
                        phase,
                        reason,
                    });
                }
                Err(TrialFailure::Abort(error)) => {
                    tracing::error!(trial = index, error = %error, "Run aborted");
                    return Err(error);
                }
                Err(TrialFailure::Cancelled) => {
                    tracing::info!(trial = index, "Shutdown requested, stopping run");
                    cancelled = true;
                    break;
                }
            }
        }

        self.observer.run_finished(&series);
        self.persist(&series)?;

        let elapsed = start.elapsed();
        let totals = summarize_series(&series);
        tracing::info!(
            elapsed_secs = elapsed.as_secs_f64(),
            recorded = totals.trials,
            skipped = skipped.len(),
            cancelled,
            total_success = totals.total_success,
            total_observed = totals.total_observed,
            "Run completed"
        );

        Ok(RunReport {
            planned,
            series,
            skipped,
            cancelled,
            elapsed,
        })
    }

    /// Run with Ctrl+C signal handling
    ///
    /// Ctrl+C stops the run at the next suspension point; trials recorded so
    /// far are still persisted.
    pub async fn run_with_signal_handling(&self) -> HarnessResult<RunReport> {
        let shutdown_tx = self.shutdown_tx.clone();

        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
                    let _ = shutdown_tx.send(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.run().await;

        signal_handle.abort();

        result
    }

    /// Burst -> settle -> observe for one trial
    async fn run_trial(
        &self,
        index: usize,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<Trial, TrialFailure> {
        let requests = self.config.burst.requests;
        let started_at = Utc::now();

        tracing::debug!(phase = %TrialPhase::RunningBurst, requests, "Entering phase");
        self.observer.burst_started(index, requests);

        let burst = tokio::select! {
            biased;
            _ = shutdown.recv() => return Err(TrialFailure::Cancelled),
            result = self.runner.run_burst(requests) => result,
        };

        let outcome = match burst {
            Ok(outcome) => outcome,
            Err(error) if error.is_trial_recoverable() => {
                return Err(TrialFailure::Skip {
                    phase: TrialPhase::RunningBurst,
                    error,
                })
            }
            Err(error) => return Err(TrialFailure::Abort(error)),
        };
        self.observer.burst_finished(&outcome);

        tracing::debug!(
            phase = %TrialPhase::Settling,
            delay_ms = self.config.trials.settle_delay_ms,
            "Entering phase"
        );
        self.settle(shutdown).await?;

        tracing::debug!(phase = %TrialPhase::ObservingAndResetting, "Entering phase");
        let observed = self.observe_and_reset(shutdown).await?;

        let trial = Trial::from_burst(
            index,
            &outcome,
            self.config.trials.multiplier,
            observed,
            started_at,
        );

        let discrepancy = trial.discrepancy();
        if discrepancy != 0 {
            tracing::warn!(
                expected = trial.success_count,
                observed = trial.observed_count,
                discrepancy = discrepancy as i64,
                "Downstream count differs from scaled success count"
            );
        }

        Ok(trial)
    }

    /// Sleep for the settle delay, reporting progress every tick
    async fn settle(&self, shutdown: &mut broadcast::Receiver<()>) -> Result<(), TrialFailure> {
        let delay = self.config.trials.settle_delay();
        let start = Instant::now();
        self.observer.settle_started(delay);

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        let mut ticker = tokio::time::interval_at(start + SETTLE_TICK, SETTLE_TICK);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => return Err(TrialFailure::Cancelled),
                _ = &mut sleep => break,
                _ = ticker.tick() => self.observer.settle_progress(start.elapsed().min(delay)),
            }
        }

        self.observer.settle_progress(delay);
        self.observer.settle_finished();
        Ok(())
    }

    /// Read-and-reset the counter, retrying per configuration
    async fn observe_and_reset(
        &self,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<u64, TrialFailure> {
        let retries = self.config.trials.counter_retries;
        let mut attempt = 0u32;

        let error = loop {
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = shutdown.recv() => return Err(TrialFailure::Cancelled),
                result = self.read_counter_once() => result,
            };

            match result {
                Ok(count) => {
                    tracing::debug!(count, attempt, "Downstream counter read and reset");
                    return Ok(count);
                }
                Err(e) if attempt <= retries => {
                    tracing::warn!(
                        attempt,
                        retries,
                        counter = self.counter.name(),
                        error = %e,
                        "Downstream counter failed, retrying"
                    );
                }
                Err(e) => break e,
            }
        };

        let error = HarnessError::Counter(error);
        match self.config.trials.on_counter_error {
            CounterFailurePolicy::Skip => Err(TrialFailure::Skip {
                phase: TrialPhase::ObservingAndResetting,
                error,
            }),
            CounterFailurePolicy::Abort => Err(TrialFailure::Abort(error)),
        }
    }

    /// One counter round-trip under the configured time bound
    async fn read_counter_once(&self) -> Result<u64, CounterError> {
        match self.config.trials.counter_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.counter.read_and_reset())
                .await
                .unwrap_or(Err(CounterError::Timeout(limit))),
            None => self.counter.read_and_reset().await,
        }
    }

    /// Append a finished trial to the series and stream it to the sinks
    fn record(&self, series: &mut TrialSeries, trial: Trial) -> HarnessResult<()> {
        tracing::debug!(phase = %TrialPhase::Recording, trial = trial.index, "Entering phase");

        for sink in &self.sinks {
            sink.append_trial(&trial).map_err(|e| {
                tracing::error!(sink = sink.name(), error = %e, "Failed to append trial");
                HarnessError::from(e)
            })?;
        }

        tracing::info!(
            trial = trial.index,
            success_count = trial.success_count,
            observed_count = trial.observed_count,
            duration_ms = trial.duration.as_millis() as u64,
            "Trial recorded"
        );
        self.observer.trial_recorded(&trial);
        series.push(trial)?;
        Ok(())
    }

    /// Hand the finished series to every sink
    fn persist(&self, series: &TrialSeries) -> HarnessResult<()> {
        for sink in &self.sinks {
            sink.persist(series).map_err(|e| {
                tracing::error!(sink = sink.name(), error = %e, "Failed to persist results");
                HarnessError::from(e)
            })?;
            tracing::debug!(sink = sink.name(), trials = series.len(), "Results persisted");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("counter", &self.counter.name())
            .field(
                "sinks",
                &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
