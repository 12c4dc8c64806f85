//! HTTP target construction errors

use burst_bench_core::HarnessError;
use thiserror::Error;

/// Errors raised while setting up an HTTP target
///
/// Failures of individual requests are [`RequestError`]s and never surface
/// here.
///
/// [`RequestError`]: burst_bench_core::RequestError
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The target URL is not an absolute http(s) URL
    #[error("invalid target URL {url:?}: {message}")]
    InvalidUrl {
        /// URL as given
        url: String,
        /// Parse or validation failure
        message: String,
    },

    /// The underlying client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<HttpError> for HarnessError {
    fn from(err: HttpError) -> Self {
        HarnessError::config(err.to_string())
    }
}
