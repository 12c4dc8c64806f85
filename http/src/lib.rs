//! HTTP request target for burst-bench
//!
//! This crate provides the reqwest-backed implementation of the
//! `RequestTarget` trait and a one-call `run_burst` helper:
//!
//! - [`HttpTarget`]: GET with `Accept-Encoding: gzip`, success on status 200
//! - [`HttpConfig`]: connection pool, timeouts and TLS verification
//! - [`run_burst`]: fire a burst at a URL and get `(successes, elapsed)`

#![warn(missing_docs)]
#![warn(clippy::all)]

mod burst;
mod client;
mod error;

pub use burst::run_burst;
pub use client::{HttpConfig, HttpTarget};
pub use error::HttpError;
