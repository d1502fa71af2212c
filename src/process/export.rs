//! Export stage: run `mysqldump` into the dump file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::config::{ConvertConfig, MysqlConfig};
use crate::error::Result;

/// Flags that make `mysqldump` output something the sanitizer understands.
pub const MYSQLDUMP_FLAGS: [&str; 5] = [
    "--skip-create-options",
    "--compatible=ansi",
    "--skip-extended-insert",
    "--compact",
    "--single-transaction",
];

/// Environment variable `mysqldump` reads the password from.
const PASSWORD_ENV: &str = "MYSQL_PWD";

/// Suffix of the file `mysqldump` writes into before it is moved into place.
const PARTIAL_SUFFIX: &str = ".part";

/// Produces the raw dump file.
pub trait Exporter {
    /// Write a complete dump to `dump_path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the dump could not be produced.
    fn export(&self, dump_path: &Path) -> Result<()>;
}

/// Runs the real `mysqldump` executable.
#[derive(Debug, Clone)]
pub struct MysqlDumpExporter {
    executable: PathBuf,
    mysql: MysqlConfig,
    timeout: Option<Duration>,
}

impl MysqlDumpExporter {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>, mysql: MysqlConfig) -> Self {
        Self {
            executable: executable.into(),
            mysql,
            timeout: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self::new(&config.tools.mysqldump, config.mysql.clone())
            .with_timeout(config.timeout_secs.map(Duration::from_secs))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed to `mysqldump`. The password is never among them.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = MYSQLDUMP_FLAGS.iter().map(OsString::from).collect();
        args.extend(
            [
                "-h".to_string(),
                self.mysql.host.clone(),
                "-P".to_string(),
                self.mysql.port.to_string(),
                "-u".to_string(),
                self.mysql.user.clone(),
                self.mysql.database.clone(),
            ]
            .map(OsString::from),
        );
        args
    }
}

impl Exporter for MysqlDumpExporter {
    fn export(&self, dump_path: &Path) -> Result<()> {
        tracing::info!(
            "Exporting {}@{}:{}/{} to {}",
            self.mysql.user,
            self.mysql.host,
            self.mysql.port,
            self.mysql.database,
            dump_path.display()
        );

        let partial = partial_path(dump_path);
        let output = File::create(&partial)?;
        let mut command = Command::new(&self.executable);
        command
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(output));
        if !self.mysql.password.is_empty() {
            command.env(PASSWORD_ENV, &self.mysql.password);
        }

        if let Err(err) = super::run_checked(command, self.timeout) {
            let _ = fs::remove_file(&partial);
            return Err(err);
        }
        fs::rename(&partial, dump_path)?;
        Ok(())
    }
}

/// `dump.sql` -> `dump.sql.part`, next to the final dump.
fn partial_path(dump_path: &Path) -> PathBuf {
    let mut name = dump_path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use tempfile::TempDir;

    fn mysql() -> MysqlConfig {
        MysqlConfig {
            host: "db.internal".to_string(),
            port: 3307,
            user: "reader".to_string(),
            password: "s3cret".to_string(),
            database: "shop".to_string(),
        }
    }

    #[test]
    fn args_follow_compact_ansi_export() {
        let exporter = MysqlDumpExporter::new("mysqldump", mysql());
        let args: Vec<String> = exporter
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--skip-create-options",
                "--compatible=ansi",
                "--skip-extended-insert",
                "--compact",
                "--single-transaction",
                "-h",
                "db.internal",
                "-P",
                "3307",
                "-u",
                "reader",
                "shop",
            ]
        );
        assert!(!args.iter().any(|a| a.contains("s3cret")));
    }

    #[cfg(unix)]
    #[test]
    fn export_writes_stdout_and_passes_password_via_env() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("fake-mysqldump");
        fs::write(
            &script,
            "#!/bin/sh\necho \"-- args: $*\"\necho \"-- pwd: $MYSQL_PWD\"\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let dump = temp.path().join("dump.sql");
        MysqlDumpExporter::new(&script, mysql()).export(&dump).unwrap();

        let written = fs::read_to_string(&dump).unwrap();
        assert!(written.contains("--compatible=ansi"));
        assert!(written.contains("-- pwd: s3cret"));
    }

    #[test]
    fn missing_executable_keeps_previous_dump() {
        let temp = TempDir::new().unwrap();
        let dump = temp.path().join("dump.sql");
        fs::write(&dump, "-- previous export").unwrap();

        let err = MysqlDumpExporter::new("definitely-not-a-real-mysqldump-m2s", mysql())
            .export(&dump)
            .unwrap_err();

        assert!(matches!(err, ConvertError::Spawn { .. }));
        assert_eq!(fs::read_to_string(&dump).unwrap(), "-- previous export");
        assert!(!partial_path(&dump).exists());
    }

    #[cfg(unix)]
    #[test]
    fn failing_dump_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("fake-mysqldump");
        fs::write(&script, "#!/bin/sh\necho 'Unknown database' >&2\nexit 2\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let dump = temp.path().join("dump.sql");
        fs::write(&dump, "-- previous export").unwrap();
        let err = MysqlDumpExporter::new(&script, mysql())
            .export(&dump)
            .unwrap_err();
        assert!(matches!(err, ConvertError::ExternalProcess { code: Some(2), .. }));
        assert_eq!(fs::read_to_string(&dump).unwrap(), "-- previous export");
    }
}
