//! Burst outcome accounting

use std::time::Duration;

/// Result of one burst
///
/// `succeeded + failed == requested` always holds for an outcome returned
/// by the engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BurstOutcome {
    /// Requests dispatched
    pub requested: usize,

    /// Requests answered with status 200
    pub succeeded: usize,

    /// Requests that failed for any reason
    pub failed: usize,

    /// First dispatch to last completion
    pub elapsed: Duration,
}

impl BurstOutcome {
    /// Outcome of a burst with no requests
    pub fn empty() -> Self {
        Self::default()
    }

    /// Total requests that terminated (succeeded + failed)
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Whether every dispatched request is accounted for
    pub fn is_complete(&self) -> bool {
        self.completed() == self.requested
    }

    /// Share of requests that succeeded (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.requested == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.requested as f64
        }
    }

    /// Completed requests per second of burst wall time
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed() as f64 / secs
        } else {
            0.0
        }
    }
}
