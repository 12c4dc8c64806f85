//! Three-line text artifact

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use burst_bench_core::{ResultSink, SinkError, TrialSeries};

use crate::create_truncated;

/// Writes the run as three bracketed lines:
///
/// ```text
/// [observed counts]
/// [scaled success counts]
/// [burst durations in seconds]
/// ```
///
/// The file is truncated on every run, so it always describes the latest
/// run only.
#[derive(Debug, Clone)]
pub struct TextArtifactSink {
    path: PathBuf,
}

impl TextArtifactSink {
    /// Sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Artifact location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for TextArtifactSink {
    fn name(&self) -> &str {
        "text"
    }

    fn persist(&self, series: &TrialSeries) -> Result<(), SinkError> {
        let file = create_truncated(&self.path)?;
        let mut writer = BufWriter::new(file);

        for line in series.result_lines() {
            writeln!(writer, "{line}").map_err(|e| SinkError::Write(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| SinkError::Write(e.to_string()))?;

        tracing::info!(
            path = %self.path.display(),
            trials = series.len(),
            "Result artifact written"
        );
        Ok(())
    }
}
