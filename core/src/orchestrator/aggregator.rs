//! Run report assembly and series totals

use std::time::Duration;

use crate::trial::TrialSeries;

use super::phase::TrialPhase;

/// A trial that was abandoned and left out of the series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTrial {
    /// Trial index
    pub index: usize,

    /// Phase in which the trial failed
    pub phase: TrialPhase,

    /// Error message
    pub reason: String,
}

/// Everything a run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Trials configured for the run
    pub planned: usize,

    /// Recorded trials in index order
    pub series: TrialSeries,

    /// Trials abandoned along the way
    pub skipped: Vec<SkippedTrial>,

    /// Whether a shutdown signal ended the run early
    pub cancelled: bool,

    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of trials that made it into the series
    pub fn recorded(&self) -> usize {
        self.series.len()
    }

    /// Whether every planned trial was recorded
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.skipped.is_empty() && self.recorded() == self.planned
    }

    /// Totals across the recorded trials
    pub fn totals(&self) -> SeriesTotals {
        summarize_series(&self.series)
    }
}

/// Sums over a trial series
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesTotals {
    /// Number of trials
    pub trials: usize,

    /// Requests dispatched across all bursts
    pub total_requested: u64,

    /// Scaled success counts added up
    pub total_success: u64,

    /// Downstream counts added up
    pub total_observed: u64,

    /// Burst wall time added up
    pub total_burst_time: Duration,
}

/// Add up a series
pub fn summarize_series(series: &TrialSeries) -> SeriesTotals {
    if series.is_empty() {
        return SeriesTotals::default();
    }

    SeriesTotals {
        trials: series.len(),
        total_requested: series.iter().map(|t| t.requested_count as u64).sum(),
        total_success: series.iter().map(|t| t.success_count).sum(),
        total_observed: series.iter().map(|t| t.observed_count).sum(),
        total_burst_time: series.iter().map(|t| t.duration).sum(),
    }
}
