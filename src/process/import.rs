//! Import stage: load the sanitized dump into the target database.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use rusqlite::Connection;

use crate::config::{ConvertConfig, ImporterKind};
use crate::error::Result;

/// Loads a sanitized dump into a SQLite file.
pub trait Importer {
    /// Execute `dump_path` against the database at `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails or the database cannot be
    /// written.
    fn import(&self, target: &Path, dump_path: &Path) -> Result<()>;
}

/// Feeds the dump to the `sqlite3` shell on stdin.
#[derive(Debug, Clone)]
pub struct SqliteShellImporter {
    executable: PathBuf,
    timeout: Option<Duration>,
}

impl SqliteShellImporter {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Importer for SqliteShellImporter {
    fn import(&self, target: &Path, dump_path: &Path) -> Result<()> {
        tracing::info!(
            "Importing {} into {} with {}",
            dump_path.display(),
            target.display(),
            self.executable.display()
        );

        let input = File::open(dump_path)?;
        let mut command = Command::new(&self.executable);
        command
            .arg("-bail")
            .arg(target)
            .stdin(Stdio::from(input))
            .stdout(Stdio::null());

        super::run_checked(command, self.timeout)
    }
}

/// Runs the dump in-process through the bundled SQLite library.
///
/// The whole dump executes in one transaction, so a failing statement
/// leaves the file without any imported rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedImporter;

impl Importer for EmbeddedImporter {
    fn import(&self, target: &Path, dump_path: &Path) -> Result<()> {
        tracing::info!(
            "Importing {} into {} (embedded)",
            dump_path.display(),
            target.display()
        );

        let sql = fs::read_to_string(dump_path)?;
        let mut conn = Connection::open(target)?;
        let tx = conn.transaction()?;
        tx.execute_batch(&sql)?;
        tx.commit()?;
        Ok(())
    }
}

/// Build the importer selected by `config`.
#[must_use]
pub fn importer_for(config: &ConvertConfig) -> Box<dyn Importer> {
    tracing::debug!("Using {} importer", config.importer.as_str());
    match config.importer {
        ImporterKind::Shell => Box::new(
            SqliteShellImporter::new(&config.tools.sqlite3)
                .with_timeout(config.timeout_secs.map(Duration::from_secs)),
        ),
        ImporterKind::Embedded => Box::new(EmbeddedImporter),
    }
}

impl<T: Importer + ?Sized> Importer for Box<T> {
    fn import(&self, target: &Path, dump_path: &Path) -> Result<()> {
        (**self).import(target, dump_path)
    }
}
