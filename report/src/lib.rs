//! Result sinks for burst-bench
//!
//! This crate provides implementations of the `ResultSink` trait for:
//!
//! - The three-line text artifact (observed, scaled success, durations)
//! - A JSON export of every trial record

#![warn(missing_docs)]
#![warn(clippy::all)]

mod json;
mod text;

pub use json::{JsonReport, JsonSink};
pub use text::TextArtifactSink;

use std::fs::File;
use std::io;
use std::path::Path;

use burst_bench_core::SinkError;

/// Create (or truncate) `path`, creating missing parent directories.
pub(crate) fn create_truncated(path: &Path) -> Result<File, SinkError> {
    let open_error = |e: io::Error| SinkError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(open_error)?;
    }

    File::create(path).map_err(open_error)
}
