//! Backup of a pre-existing target database.
//!
//! This module handles:
//! - Moving an existing target aside to `<target>.bk` before import
//! - Verifying the copy by content hash before the original is removed
//! - Restoring the `.bk` copy when import fails

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{ConvertError, Result};

/// Suffix appended to the target file name.
pub const BACKUP_SUFFIX: &str = ".bk";

/// Backup entry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub size: u64,
    /// Hex SHA-256 of the backed-up content.
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Sibling path holding the backup of `target`.
#[must_use]
pub fn backup_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(BACKUP_SUFFIX);
    target.with_file_name(name)
}

/// Move an existing `target` aside to `<target>.bk`.
///
/// Returns `None` when there is nothing at `target`. An older `.bk` is
/// overwritten.
///
/// # Errors
///
/// Returns [`ConvertError::Backup`] if the copy, its verification or the
/// removal of the original fails. The original is never removed unless
/// the copy matches it.
pub fn backup_existing(target: &Path) -> Result<Option<BackupEntry>> {
    if !target.exists() {
        tracing::debug!("No previous database at {}", target.display());
        return Ok(None);
    }
    if !target.is_file() {
        return Err(ConvertError::backup(target, "target exists and is not a regular file"));
    }

    let backup_path = backup_path_for(target);
    let size = fs::copy(target, &backup_path)
        .map_err(|e| ConvertError::backup(target, format!("copy to {}: {e}", backup_path.display())))?;

    let original = hash_file(target).map_err(|e| ConvertError::backup(target, e))?;
    let copied = hash_file(&backup_path).map_err(|e| ConvertError::backup(&backup_path, e))?;
    if original != copied {
        return Err(ConvertError::backup(
            target,
            format!("copy at {} does not match the original", backup_path.display()),
        ));
    }

    fs::remove_file(target).map_err(|e| ConvertError::backup(target, format!("remove: {e}")))?;
    tracing::info!("Backed up {} to {}", target.display(), backup_path.display());

    Ok(Some(BackupEntry {
        path: backup_path,
        size,
        sha256: original,
        created_at: Utc::now(),
    }))
}

/// Put `<target>.bk` back in place of `target`.
///
/// Any partially written `target` is removed first. Returns `false` when
/// there is no backup to restore.
///
/// # Errors
///
/// Returns [`ConvertError::Backup`] if the partial target cannot be removed
/// or the backup cannot be renamed.
pub fn restore_backup(target: &Path) -> Result<bool> {
    let backup_path = backup_path_for(target);
    if !backup_path.is_file() {
        return Ok(false);
    }

    if target.exists() {
        fs::remove_file(target)
            .map_err(|e| ConvertError::backup(target, format!("remove partial import: {e}")))?;
    }
    fs::rename(&backup_path, target).map_err(|e| {
        ConvertError::backup(&backup_path, format!("restore to {}: {e}", target.display()))
    })?;

    tracing::warn!("Restored {} from {}", target.display(), backup_path.display());
    Ok(true)
}

/// Hex SHA-256 of a file's content.
fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
