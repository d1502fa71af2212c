//! Conversion pipeline: export, sanitize, backup, import, verify.
//!
//! Stages run strictly in order. Any failure aborts the run; if the import
//! stage fails after a backup was taken, the backup is put back.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use dump_sanitizer::{SanitizeStats, Sanitizer, SourceEncoding};
use serde::Serialize;

use crate::backup::{self, BackupEntry};
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::process::{Exporter, Importer};
use crate::verify::{self, VerifySummary};

/// Summary of one successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub target: PathBuf,
    pub dump_file: PathBuf,
    pub sanitize: SanitizeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify: Option<VerifySummary>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u128,
}

/// Sanitize a dump file, writing UTF-8 to `output` (which may equal `input`).
///
/// # Errors
///
/// Returns an I/O error if either file cannot be accessed and
/// [`ConvertError::Sanitize`] if the dump cannot be decoded or is malformed.
/// `output` is left untouched on a sanitize failure.
pub fn sanitize_file(input: &Path, output: &Path, encoding: SourceEncoding) -> Result<SanitizeStats> {
    let raw = fs::read(input)?;
    let sanitized = Sanitizer::new(encoding)
        .sanitize(&raw)
        .map_err(|e| ConvertError::sanitize(input, e))?;
    fs::write(output, sanitized.text.as_bytes())?;

    tracing::info!(
        "Sanitized {} -> {} ({} of {} lines kept)",
        input.display(),
        output.display(),
        sanitized.stats.lines_written,
        sanitized.stats.lines_read
    );
    Ok(sanitized.stats)
}

/// Runs conversions with a fixed configuration and collaborators.
pub struct Converter<'a, E, I> {
    config: &'a ConvertConfig,
    exporter: E,
    importer: I,
}

impl<'a, E: Exporter, I: Importer> Converter<'a, E, I> {
    #[must_use]
    pub const fn new(config: &'a ConvertConfig, exporter: E, importer: I) -> Self {
        Self {
            config,
            exporter,
            importer,
        }
    }

    /// Convert the configured MySQL database into a SQLite file at `target`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage. When import or
    /// verification fails after a backup was taken and
    /// `restore_on_failure` is set, the previous database is restored
    /// before the error is returned.
    pub fn convert(&self, target: &Path) -> Result<ConversionReport> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let dump_file = self.config.dump_file.as_path();

        self.exporter.export(dump_file)?;
        let stats = sanitize_file(dump_file, dump_file, self.config.encoding)?;
        let backup = backup::backup_existing(target)?;

        let verify = match self.import_and_verify(target, dump_file) {
            Ok(summary) => summary,
            Err(err) => {
                self.recover(target, backup.is_some());
                return Err(err);
            }
        };

        let report = ConversionReport {
            target: display_path(target),
            dump_file: display_path(dump_file),
            sanitize: stats,
            backup,
            verify,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: clock.elapsed().as_millis(),
        };
        tracing::info!(
            "Converted {} into {} in {}ms",
            self.config.mysql.database,
            report.target.display(),
            report.elapsed_ms
        );
        Ok(report)
    }

    fn import_and_verify(&self, target: &Path, dump_file: &Path) -> Result<Option<VerifySummary>> {
        self.importer.import(target, dump_file)?;
        if self.config.verify {
            verify::verify_database(target).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Undo a failed import. Errors here are logged; the import error wins.
    fn recover(&self, target: &Path, had_backup: bool) {
        if had_backup && self.config.restore_on_failure {
            if let Err(e) = backup::restore_backup(target) {
                tracing::error!("Could not restore previous database: {e}");
            }
        } else if target.exists() {
            if let Err(e) = fs::remove_file(target) {
                tracing::error!("Could not remove partial database {}: {e}", target.display());
            }
        }
    }
}

fn display_path(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EmbeddedImporter;
    use std::cell::RefCell;
    use tempfile::TempDir;

    const RAW_DUMP: &[u8] = b"CREATE TABLE \"users\" (\n  \"id\" int(10) unsigned NOT NULL,\n  \"name\" varchar(40) COLLATE latin1_swedish_ci DEFAULT NULL,\n  PRIMARY KEY (\"id\"),\n  KEY \"name\" (\"name\")\n);\nINSERT INTO \"users\" VALUES (1,'Ren\xe9e O\\'Hara');\n";

    /// Writes a canned dump instead of calling mysqldump.
    struct CannedExporter(&'static [u8]);

    impl Exporter for CannedExporter {
        fn export(&self, dump_path: &Path) -> Result<()> {
            fs::write(dump_path, self.0)?;
            Ok(())
        }
    }

    struct FailingExporter;

    impl Exporter for FailingExporter {
        fn export(&self, _dump_path: &Path) -> Result<()> {
            Err(ConvertError::ExternalProcess {
                program: "mysqldump".to_string(),
                code: Some(2),
                stderr: "Access denied".to_string(),
            })
        }
    }

    /// Writes junk to the target, then fails.
    struct BrokenImporter;

    impl Importer for BrokenImporter {
        fn import(&self, target: &Path, _dump_path: &Path) -> Result<()> {
            fs::write(target, b"partial")?;
            Err(ConvertError::ExternalProcess {
                program: "sqlite3".to_string(),
                code: Some(1),
                stderr: "near \"KEY\": syntax error".to_string(),
            })
        }
    }

    /// Captures the dump it was handed, then imports it for real.
    #[derive(Default)]
    struct RecordingImporter {
        seen_dump: RefCell<Option<String>>,
    }

    impl Importer for RecordingImporter {
        fn import(&self, target: &Path, dump_path: &Path) -> Result<()> {
            assert!(!target.exists(), "import must start from an empty target");
            *self.seen_dump.borrow_mut() = Some(fs::read_to_string(dump_path)?);
            EmbeddedImporter.import(target, dump_path)
        }
    }

    fn config_in(dir: &Path) -> ConvertConfig {
        let mut config = ConvertConfig::default();
        config.mysql.database = "shop".to_string();
        config.dump_file = dir.join("dump.sql");
        config
    }

    #[test]
    fn full_run_produces_queryable_database() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let target = temp.path().join("shop.db");

        let report = Converter::new(&config, CannedExporter(RAW_DUMP), EmbeddedImporter)
            .convert(&target)
            .unwrap();

        assert_eq!(report.sanitize.key_lines_dropped, 2);
        assert_eq!(report.sanitize.trailing_commas_removed, 1);
        assert!(report.backup.is_none());
        let verify = report.verify.unwrap();
        assert_eq!(verify.total_rows(), 1);

        let conn = rusqlite::Connection::open(&target).unwrap();
        let name: String = conn
            .query_row("SELECT name FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Ren\u{e9}e O'Hara");
    }

    #[test]
    fn dump_file_is_sanitized_in_place() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let importer = RecordingImporter::default();
        let converter = Converter::new(&config, CannedExporter(RAW_DUMP), importer);

        converter.convert(&temp.path().join("shop.db")).unwrap();

        let on_disk = fs::read_to_string(&config.dump_file).unwrap();
        assert!(!on_disk.contains("KEY"));
        assert!(!on_disk.contains("unsigned"));
        assert!(on_disk.contains("\"name\" varchar(40) DEFAULT NULL\n);"));
        assert_eq!(converter.importer.seen_dump.borrow().as_deref(), Some(on_disk.as_str()));
    }

    #[test]
    fn previous_database_is_kept_as_bk() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let target = temp.path().join("shop.db");
        fs::write(&target, b"previous contents").unwrap();

        let report = Converter::new(&config, CannedExporter(RAW_DUMP), RecordingImporter::default())
            .convert(&target)
            .unwrap();

        let backup = report.backup.unwrap();
        assert_eq!(fs::read(&backup.path).unwrap(), b"previous contents");
        assert_eq!(backup.path, temp.path().join("shop.db.bk"));
        assert!(verify::verify_database(&target).is_ok());
    }

    #[test]
    fn failed_import_restores_backup() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let target = temp.path().join("shop.db");
        fs::write(&target, b"previous contents").unwrap();

        let err = Converter::new(&config, CannedExporter(RAW_DUMP), BrokenImporter)
            .convert(&target)
            .unwrap_err();

        assert!(matches!(err, ConvertError::ExternalProcess { .. }));
        assert_eq!(fs::read(&target).unwrap(), b"previous contents");
        assert!(!backup::backup_path_for(&target).exists());
    }

    #[test]
    fn failed_import_without_restore_keeps_bk_and_removes_partial() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(temp.path());
        config.restore_on_failure = false;
        let target = temp.path().join("shop.db");
        fs::write(&target, b"previous contents").unwrap();

        Converter::new(&config, CannedExporter(RAW_DUMP), BrokenImporter)
            .convert(&target)
            .unwrap_err();

        assert!(!target.exists());
        assert_eq!(
            fs::read(backup::backup_path_for(&target)).unwrap(),
            b"previous contents"
        );
    }

    #[test]
    fn export_failure_leaves_target_untouched() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let target = temp.path().join("shop.db");
        fs::write(&target, b"previous contents").unwrap();

        let err = Converter::new(&config, FailingExporter, EmbeddedImporter)
            .convert(&target)
            .unwrap_err();

        assert!(matches!(err, ConvertError::ExternalProcess { code: Some(2), .. }));
        assert_eq!(fs::read(&target).unwrap(), b"previous contents");
        assert!(!backup::backup_path_for(&target).exists());
    }

    #[test]
    fn malformed_dump_aborts_before_backup() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let target = temp.path().join("shop.db");
        fs::write(&target, b"previous contents").unwrap();

        let err = Converter::new(&config, CannedExporter(b");\n"), EmbeddedImporter)
            .convert(&target)
            .unwrap_err();

        assert!(matches!(err, ConvertError::Sanitize { .. }));
        assert!(target.exists());
        assert_eq!(fs::read(&config.dump_file).unwrap(), b");\n");
    }

    #[test]
    fn sanitize_file_to_separate_output() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.sql");
        let output = temp.path().join("out.sql");
        fs::write(&input, b"\"a\" int unsigned").unwrap();

        let stats = sanitize_file(&input, &output, SourceEncoding::Utf8).unwrap();

        assert_eq!(stats.unsigned_removed, 1);
        assert_eq!(fs::read_to_string(&output).unwrap(), "\"a\" int");
        assert_eq!(fs::read_to_string(&input).unwrap(), "\"a\" int unsigned");
    }
}
