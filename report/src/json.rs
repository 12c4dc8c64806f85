//! JSON export of every trial record

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use burst_bench_core::{summarize_series, ResultSink, SinkError, TrialSeries};

use crate::create_truncated;

/// Document written by [`JsonSink`]
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// When the document was produced
    pub generated_at: DateTime<Utc>,

    /// Number of recorded trials
    pub trial_count: usize,

    /// Scaled success counts added up
    pub total_success: u64,

    /// Downstream counts added up
    pub total_observed: u64,

    /// Every recorded trial in index order
    pub trials: &'a TrialSeries,
}

impl<'a> JsonReport<'a> {
    /// Build a report for `series`, stamped now
    pub fn new(series: &'a TrialSeries) -> Self {
        let totals = summarize_series(series);
        Self {
            generated_at: Utc::now(),
            trial_count: totals.trials,
            total_success: totals.total_success,
            total_observed: totals.total_observed,
            trials: series,
        }
    }
}

/// Writes the series as a pretty-printed JSON document
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    /// Sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonSink {
    fn name(&self) -> &str {
        "json"
    }

    fn persist(&self, series: &TrialSeries) -> Result<(), SinkError> {
        let file = create_truncated(&self.path)?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, &JsonReport::new(series))
            .map_err(|e| SinkError::Encode(e.to_string()))?;
        writeln!(writer).map_err(|e| SinkError::Write(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| SinkError::Write(e.to_string()))?;

        tracing::info!(path = %self.path.display(), trials = series.len(), "JSON export written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burst_bench_core::{BurstOutcome, Trial};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_json_export_contains_every_trial() {
        let dir = TempDir::new().unwrap();
        let sink = JsonSink::new(dir.path().join("out").join("result.json"));

        let mut series = TrialSeries::new();
        for index in [1, 2, 4] {
            let outcome = BurstOutcome {
                requested: 100,
                succeeded: 100,
                failed: 0,
                elapsed: Duration::from_millis(500),
            };
            series
                .push(Trial::from_burst(index, &outcome, 2, 199, Utc::now()))
                .unwrap();
        }

        sink.persist(&series).unwrap();

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(doc["trial_count"], 3);
        assert_eq!(doc["total_success"], 600);
        assert_eq!(doc["total_observed"], 597);
        assert!(doc["generated_at"].is_string());

        let trials = doc["trials"].as_array().unwrap();
        assert_eq!(trials.len(), 3);
        assert_eq!(trials[2]["index"], 4);
        assert_eq!(trials[0]["duration_secs"], 0.5);
    }
}
