//! Error types for `mysql2sqlite`.

use std::path::PathBuf;

use dump_sanitizer::SanitizeError;
use thiserror::Error;

/// Primary error type for conversion runs.
#[derive(Error, Debug)]
pub enum ConvertError {
    // === Dump Errors ===
    /// The dump could not be decoded or is structurally broken.
    #[error("Sanitize failed for {path}: {source}")]
    Sanitize {
        path: PathBuf,
        #[source]
        source: SanitizeError,
    },

    // === External Process Errors ===
    /// The executable could not be started at all.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully.
    #[error("{program} failed ({}): {stderr}", exit_label(.code))]
    ExternalProcess {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process exceeded the configured timeout and was killed.
    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    // === Filesystem Errors ===
    /// Backing up or restoring the previous database failed.
    #[error("Backup of {path} failed: {reason}")]
    Backup { path: PathBuf, reason: String },

    /// The imported database did not pass verification.
    #[error("Verification of {path} failed: {reason}")]
    Verification { path: PathBuf, reason: String },

    // === Configuration Errors ===
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML config parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error from the embedded importer or verification.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(
        || "terminated by signal".to_string(),
        |c| format!("exit code {c}"),
    )
}

impl ConvertError {
    #[must_use]
    pub fn backup(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Backup {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn sanitize(path: impl Into<PathBuf>, source: SanitizeError) -> Self {
        Self::Sanitize {
            path: path.into(),
            source,
        }
    }
}

/// Result type using `ConvertError`.
pub type Result<T> = std::result::Result<T, ConvertError>;
