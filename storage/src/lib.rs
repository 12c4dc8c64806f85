//! Downstream counter for burst-bench
//!
//! This crate provides the sqlx-backed implementation of the
//! `DownstreamCounter` trait. The backend is chosen by URL scheme through
//! sqlx's `Any` driver:
//!
//! - MySQL / MariaDB (`mysql://`, `mariadb://`)
//! - SQLite (`sqlite:`)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod counter;

pub use counter::{Backend, SqlCounter};
