//! indicatif-backed run observer

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use burst_bench_core::{BurstOutcome, RunObserver, Trial, TrialSeries};

const BURST_TEMPLATE: &str =
    "{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
const SETTLE_TEMPLATE: &str = "{prefix} [{bar:40}] {pos}/{len} ms";

/// Renders run progress on the terminal.
///
/// Bars are drawn to stderr; trial summaries and the final result lines go
/// to the configured writer (stdout by default).
pub struct ConsoleObserver {
    show_progress: bool,
    out: Mutex<Box<dyn Write + Send>>,
    burst_bar: Mutex<Option<ProgressBar>>,
    settle_bar: Mutex<Option<ProgressBar>>,
    failed: AtomicUsize,
}

impl ConsoleObserver {
    /// Observer printing to stdout, with or without progress bars
    pub fn new(show_progress: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), show_progress)
    }

    /// Observer printing summaries to `out`
    pub fn with_writer(out: Box<dyn Write + Send>, show_progress: bool) -> Self {
        Self {
            show_progress,
            out: Mutex::new(out),
            burst_bar: Mutex::new(None),
            settle_bar: Mutex::new(None),
            failed: AtomicUsize::new(0),
        }
    }

    fn new_bar(&self, len: u64, template: &str, chars: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(chars);

        let bar = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
        bar.set_style(style);
        bar
    }

    fn print_line(&self, line: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::debug!(error = %e, "Failed to write console output");
        }
    }
}

/// Take the bar out of its slot, if any
fn take(slot: &Mutex<Option<ProgressBar>>) -> Option<ProgressBar> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

/// Clone the bar in its slot, if any
fn current(slot: &Mutex<Option<ProgressBar>>) -> Option<ProgressBar> {
    slot.lock().ok().and_then(|guard| guard.clone())
}

fn store(slot: &Mutex<Option<ProgressBar>>, bar: ProgressBar) {
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(bar);
    }
}

/// One-line summary of a recorded trial
pub fn format_trial_line(trial: &Trial) -> String {
    format!(
        "Trial {:>3}: success_count = {:>6}, observed = {:>6}, duration = {:.3}s",
        trial.index,
        trial.success_count,
        trial.observed_count,
        trial.duration.as_secs_f64()
    )
}

/// Note printed after a burst in which some requests failed
pub fn format_failure_line(outcome: &BurstOutcome) -> String {
    format!(
        "      {} of {} requests failed ({:.1}% succeeded)",
        outcome.failed,
        outcome.requested,
        outcome.success_rate() * 100.0
    )
}

impl RunObserver for ConsoleObserver {
    fn burst_started(&self, trial: usize, total: usize) {
        self.failed.store(0, Ordering::SeqCst);
        let bar = self.new_bar(total as u64, BURST_TEMPLATE, "#>-");
        bar.set_prefix(format!("Trial {trial}"));
        if self.show_progress {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        store(&self.burst_bar, bar);
    }

    fn request_finished(&self, success: bool) {
        let Some(bar) = current(&self.burst_bar) else {
            return;
        };
        if !success {
            let failed = self.failed.fetch_add(1, Ordering::SeqCst) + 1;
            bar.set_message(format!("{failed} failed"));
        }
        bar.inc(1);
    }

    fn burst_finished(&self, outcome: &BurstOutcome) {
        if let Some(bar) = take(&self.burst_bar) {
            bar.finish_and_clear();
        }
        if outcome.failed > 0 {
            self.print_line(&format_failure_line(outcome));
        }
    }

    fn settle_started(&self, delay: Duration) {
        let bar = self.new_bar(delay.as_millis() as u64, SETTLE_TEMPLATE, "=> ");
        bar.set_prefix("Waiting...");
        store(&self.settle_bar, bar);
    }

    fn settle_progress(&self, elapsed: Duration) {
        if let Some(bar) = current(&self.settle_bar) {
            bar.set_position(elapsed.as_millis() as u64);
        }
    }

    fn settle_finished(&self) {
        if let Some(bar) = take(&self.settle_bar) {
            bar.finish_and_clear();
        }
    }

    fn trial_recorded(&self, trial: &Trial) {
        self.print_line(&format_trial_line(trial));
    }

    fn trial_skipped(&self, trial: usize, reason: &str) {
        for slot in [&self.burst_bar, &self.settle_bar] {
            if let Some(bar) = take(slot) {
                bar.abandon();
            }
        }
        self.print_line(&format!("Trial {trial:>3}: skipped ({reason})"));
    }

    fn run_finished(&self, series: &TrialSeries) {
        for slot in [&self.burst_bar, &self.settle_bar] {
            if let Some(bar) = take(slot) {
                bar.finish_and_clear();
            }
        }
        for line in series.result_lines() {
            self.print_line(&line);
        }
    }
}

impl std::fmt::Debug for ConsoleObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleObserver")
            .field("show_progress", &self.show_progress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burst_bench_core::BurstOutcome;
    use chrono::Utc;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn trial(index: usize, succeeded: usize, observed: u64) -> Trial {
        let outcome = BurstOutcome {
            requested: 1000,
            succeeded,
            failed: 1000 - succeeded,
            elapsed: Duration::from_millis(1234),
        };
        Trial::from_burst(index, &outcome, 2, observed, Utc::now())
    }

    #[test]
    fn test_format_trial_line() {
        let line = format_trial_line(&trial(3, 1000, 1990));
        assert_eq!(
            line,
            "Trial   3: success_count =   2000, observed =   1990, duration = 1.234s"
        );
    }

    #[test]
    fn test_observer_prints_summaries_and_results() {
        let buffer = SharedBuffer::default();
        let observer = ConsoleObserver::with_writer(Box::new(buffer.clone()), false);

        observer.burst_started(1, 1000);
        for i in 0..10 {
            observer.request_finished(i % 5 != 0);
        }
        observer.burst_finished(&BurstOutcome::empty());
        observer.settle_started(Duration::from_millis(300));
        observer.settle_progress(Duration::from_millis(100));
        observer.settle_finished();

        let mut series = TrialSeries::new();
        let first = trial(1, 1000, 2000);
        observer.trial_recorded(&first);
        series.push(first).unwrap();
        observer.trial_skipped(2, "burst timed out after 1s");
        observer.run_finished(&series);

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Trial   1: success_count =   2000"));
        assert_eq!(lines[1], "Trial   2: skipped (burst timed out after 1s)");
        assert_eq!(lines[2], "[2000]");
        assert_eq!(lines[3], "[2000]");
        assert_eq!(lines[4], "[1.234]");
    }

    #[test]
    fn test_burst_with_failures_prints_success_rate() {
        let buffer = SharedBuffer::default();
        let observer = ConsoleObserver::with_writer(Box::new(buffer.clone()), false);

        observer.burst_started(1, 8);
        observer.burst_finished(&BurstOutcome {
            requested: 8,
            succeeded: 6,
            failed: 2,
            elapsed: Duration::from_millis(40),
        });
        observer.burst_started(2, 8);
        observer.burst_finished(&BurstOutcome {
            requested: 8,
            succeeded: 8,
            failed: 0,
            elapsed: Duration::from_millis(40),
        });

        assert_eq!(
            buffer.contents(),
            "      2 of 8 requests failed (75.0% succeeded)\n"
        );
    }

    #[test]
    fn test_request_finished_without_burst_is_ignored() {
        let observer = ConsoleObserver::with_writer(Box::new(io::sink()), false);
        observer.request_finished(true);
        observer.settle_progress(Duration::from_millis(5));
        assert_eq!(observer.failed.load(Ordering::SeqCst), 0);
    }
}
