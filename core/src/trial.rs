//! Trial records and the ordered series a run produces

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::burst::BurstOutcome;

/// One completed measurement cycle: burst, settle, observe-and-reset
///
/// A trial is built once its counter observation is in and is never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Ordinal position in the run, starting at 1
    pub index: usize,

    /// Number of concurrent requests issued
    pub requested_count: usize,

    /// Successful requests scaled by the downstream multiplier
    pub success_count: u64,

    /// Wall time of the burst, first dispatch to last completion
    #[serde(rename = "duration_secs", with = "duration_secs")]
    pub duration: Duration,

    /// Downstream counter value read just before it was reset
    pub observed_count: u64,

    /// When the trial's burst began
    pub started_at: DateTime<Utc>,
}

impl Trial {
    /// Build a trial from a finished burst and the counter observation
    /// that followed it.
    pub fn from_burst(
        index: usize,
        outcome: &BurstOutcome,
        multiplier: u32,
        observed_count: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            requested_count: outcome.requested,
            success_count: (outcome.succeeded as u64).saturating_mul(u64::from(multiplier)),
            duration: outcome.elapsed,
            observed_count,
            started_at,
        }
    }

    /// Observed minus expected downstream records.
    ///
    /// Positive when the store saw more records than the successful
    /// requests account for, negative when records are missing.
    pub fn discrepancy(&self) -> i128 {
        i128::from(self.observed_count) - i128::from(self.success_count)
    }
}

/// Returned when a trial would break index ordering
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("trial {index} cannot follow trial {last}")]
pub struct SeriesError {
    /// Index of the rejected trial
    pub index: usize,
    /// Index of the last trial already in the series
    pub last: usize,
}

/// Trials of one run in index order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialSeries {
    trials: Vec<Trial>,
}

impl TrialSeries {
    /// Create an empty series
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trial. Indices must be strictly increasing; gaps are
    /// expected where trials were skipped.
    pub fn push(&mut self, trial: Trial) -> Result<(), SeriesError> {
        if let Some(last) = self.trials.last() {
            if trial.index <= last.index {
                return Err(SeriesError {
                    index: trial.index,
                    last: last.index,
                });
            }
        }
        self.trials.push(trial);
        Ok(())
    }

    /// Number of recorded trials
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Whether no trial has been recorded
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Iterate over the trials in index order
    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }

    /// Recorded trials as a slice
    pub fn as_slice(&self) -> &[Trial] {
        &self.trials
    }

    /// Indices of the recorded trials
    pub fn indices(&self) -> Vec<usize> {
        self.trials.iter().map(|t| t.index).collect()
    }

    /// Downstream counts, one per trial
    pub fn observed_counts(&self) -> Vec<u64> {
        self.trials.iter().map(|t| t.observed_count).collect()
    }

    /// Scaled success counts, one per trial
    pub fn success_counts(&self) -> Vec<u64> {
        self.trials.iter().map(|t| t.success_count).collect()
    }

    /// Burst durations in seconds, one per trial
    pub fn durations_secs(&self) -> Vec<f64> {
        self.trials
            .iter()
            .map(|t| t.duration.as_secs_f64())
            .collect()
    }

    /// The three result sequences in artifact order: observed counts,
    /// scaled success counts, durations in seconds.
    pub fn result_lines(&self) -> [String; 3] {
        [
            format_sequence(&self.observed_counts()),
            format_sequence(&self.success_counts()),
            format_sequence(&self.durations_secs()),
        ]
    }
}

impl<'a> IntoIterator for &'a TrialSeries {
    type Item = &'a Trial;
    type IntoIter = std::slice::Iter<'a, Trial>;

    fn into_iter(self) -> Self::IntoIter {
        self.trials.iter()
    }
}

/// Render values as `[a, b, c]`
pub fn format_sequence<T: Display>(values: &[T]) -> String {
    let body = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{body}]")
}

mod duration_secs {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(requested: usize, succeeded: usize, elapsed_ms: u64) -> BurstOutcome {
        BurstOutcome {
            requested,
            succeeded,
            failed: requested - succeeded,
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    fn trial(index: usize, observed: u64) -> Trial {
        Trial::from_burst(index, &outcome(10, 10, 1500), 2, observed, Utc::now())
    }

    #[test]
    fn test_trial_scales_success_count() {
        let t = Trial::from_burst(1, &outcome(1000, 1000, 800), 2, 500, Utc::now());
        assert_eq!(t.requested_count, 1000);
        assert_eq!(t.success_count, 2000);
        assert_eq!(t.observed_count, 500);
        assert_eq!(t.duration, Duration::from_millis(800));
    }

    #[test]
    fn test_trial_success_bounded_by_requested_times_multiplier() {
        let t = Trial::from_burst(1, &outcome(100, 73, 10), 3, 0, Utc::now());
        assert!(t.success_count <= t.requested_count as u64 * 3);
        assert_eq!(t.success_count, 219);
    }

    #[test]
    fn test_trial_discrepancy() {
        let t = trial(1, 15);
        assert_eq!(t.success_count, 20);
        assert_eq!(t.discrepancy(), -5);

        let t = trial(1, 26);
        assert_eq!(t.discrepancy(), 6);
    }

    #[test]
    fn test_series_accepts_gaps() {
        let mut series = TrialSeries::new();
        series.push(trial(1, 20)).unwrap();
        series.push(trial(3, 20)).unwrap();
        assert_eq!(series.indices(), vec![1, 3]);
    }

    #[test]
    fn test_series_rejects_out_of_order() {
        let mut series = TrialSeries::new();
        series.push(trial(2, 20)).unwrap();

        let err = series.push(trial(2, 20)).unwrap_err();
        assert_eq!(err, SeriesError { index: 2, last: 2 });

        assert!(series.push(trial(1, 20)).is_err());
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_format_sequence() {
        assert_eq!(format_sequence::<u64>(&[]), "[]");
        assert_eq!(format_sequence(&[7u64]), "[7]");
        assert_eq!(format_sequence(&[1u64, 2, 3]), "[1, 2, 3]");
        assert_eq!(format_sequence(&[1.5f64, 0.25]), "[1.5, 0.25]");
    }

    #[test]
    fn test_result_lines_order() {
        let mut series = TrialSeries::new();
        series
            .push(Trial::from_burst(1, &outcome(4, 4, 1500), 2, 7, Utc::now()))
            .unwrap();
        series
            .push(Trial::from_burst(2, &outcome(4, 3, 250), 2, 6, Utc::now()))
            .unwrap();

        let [observed, success, durations] = series.result_lines();
        assert_eq!(observed, "[7, 6]");
        assert_eq!(success, "[8, 6]");
        assert_eq!(durations, "[1.5, 0.25]");
    }

    #[test]
    fn test_trial_json_uses_seconds() {
        let t = Trial::from_burst(4, &outcome(2, 2, 1250), 1, 2, Utc::now());
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["duration_secs"], serde_json::json!(1.25));
        assert_eq!(json["index"], serde_json::json!(4));

        let back: Trial = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(1250));
    }
}
