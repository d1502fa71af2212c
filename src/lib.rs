//! `mysql2sqlite` - MySQL to SQLite conversion library
//!
//! This crate provides the functionality behind the `mysql2sqlite` CLI:
//! export a MySQL database with `mysqldump`, rewrite the dump so SQLite
//! accepts it, and load it into a SQLite file.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Layered configuration (defaults, YAML, env, CLI)
//! - [`error`] - Error types and handling
//! - [`logging`] - tracing subscriber setup
//! - [`process`] - `mysqldump` exporter and SQLite importers
//! - [`backup`] - `.bk` backup and restore of a previous target
//! - [`verify`] - Post-import integrity check
//! - [`pipeline`] - Stage ordering and failure recovery
//!
//! The dump rewrite itself lives in the `dump-sanitizer` crate.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod verify;

pub use dump_sanitizer;
pub use error::{ConvertError, Result};

/// Run the CLI application.
///
/// This is the main entry point called from `main()`.
///
/// # Errors
///
/// Returns an error if command execution fails.
pub fn run() -> anyhow::Result<()> {
    cli::run()
}
