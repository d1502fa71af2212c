//! Configuration management for `mysql2sqlite`.
//!
//! Configuration is layered, later layers winning:
//! - Built-in defaults
//! - YAML file (`--config`, else `mysql2sqlite.yaml` in the working directory)
//! - Environment variables (`MYSQL2SQLITE_*`)
//! - CLI overrides
//!
//! The resolved [`ConvertConfig`] is immutable for the rest of the run.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use dump_sanitizer::SourceEncoding;
use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "mysql2sqlite.yaml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "MYSQL2SQLITE_";

const REDACTED: &str = "********";

/// MySQL connection parameters handed to `mysqldump`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: String::new(),
        }
    }
}

/// Paths of the external executables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub mysqldump: PathBuf,
    pub sqlite3: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mysqldump: PathBuf::from("mysqldump"),
            sqlite3: PathBuf::from("sqlite3"),
        }
    }
}

/// How the sanitized dump is loaded into SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImporterKind {
    /// Pipe the dump into the `sqlite3` shell.
    #[default]
    Shell,
    /// Execute the dump in-process through the bundled SQLite library.
    Embedded,
}

impl ImporterKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::Embedded => "embedded",
        }
    }
}

impl FromStr for ImporterKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shell" => Ok(Self::Shell),
            "embedded" => Ok(Self::Embedded),
            other => Err(format!(
                "unknown importer '{other}' (expected shell or embedded)"
            )),
        }
    }
}

/// Fully resolved configuration for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub mysql: MysqlConfig,
    pub tools: ToolsConfig,
    /// Where `mysqldump` writes; sanitized in place afterwards.
    pub dump_file: PathBuf,
    pub encoding: SourceEncoding,
    pub importer: ImporterKind,
    /// Kill an external process after this many seconds.
    pub timeout_secs: Option<u64>,
    /// Run an integrity check on the imported database.
    pub verify: bool,
    /// Put the `.bk` copy back when import fails.
    pub restore_on_failure: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            mysql: MysqlConfig::default(),
            tools: ToolsConfig::default(),
            dump_file: PathBuf::from("dump.sql"),
            encoding: SourceEncoding::default(),
            importer: ImporterKind::default(),
            timeout_secs: None,
            verify: true,
            restore_on_failure: true,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub dump_file: Option<PathBuf>,
    pub mysqldump: Option<PathBuf>,
    pub sqlite3: Option<PathBuf>,
    pub encoding: Option<SourceEncoding>,
    pub importer: Option<ImporterKind>,
    pub timeout_secs: Option<u64>,
    pub no_verify: bool,
    pub no_restore: bool,
}

impl ConvertConfig {
    /// Parse a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&contents)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve all layers against the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit config file is missing or invalid, or
    /// an environment variable holds an unparsable value.
    pub fn load(explicit: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        Self::load_with(explicit, overrides, |key| std::env::var(key).ok())
    }

    /// Resolve all layers with a custom environment lookup.
    ///
    /// # Errors
    ///
    /// See [`ConvertConfig::load`].
    pub fn load_with<F>(explicit: Option<&Path>, overrides: &CliOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(env)?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Apply `MYSQL2SQLITE_*` environment values.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Config`] for values that do not parse.
    pub fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| env(&format!("{ENV_PREFIX}{name}"));

        if let Some(host) = var("HOST") {
            self.mysql.host = host;
        }
        if let Some(port) = var("PORT") {
            self.mysql.port = parse_env(&format!("{ENV_PREFIX}PORT"), &port)?;
        }
        if let Some(user) = var("USER") {
            self.mysql.user = user;
        }
        if let Some(password) = var("PASSWORD") {
            self.mysql.password = password;
        }
        if let Some(database) = var("DATABASE") {
            self.mysql.database = database;
        }
        if let Some(path) = var("MYSQLDUMP") {
            self.tools.mysqldump = PathBuf::from(path);
        }
        if let Some(path) = var("SQLITE3") {
            self.tools.sqlite3 = PathBuf::from(path);
        }
        if let Some(encoding) = var("ENCODING") {
            self.encoding = parse_env(&format!("{ENV_PREFIX}ENCODING"), &encoding)?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(host) = &overrides.host {
            self.mysql.host.clone_from(host);
        }
        if let Some(port) = overrides.port {
            self.mysql.port = port;
        }
        if let Some(user) = &overrides.user {
            self.mysql.user.clone_from(user);
        }
        if let Some(password) = &overrides.password {
            self.mysql.password.clone_from(password);
        }
        if let Some(database) = &overrides.database {
            self.mysql.database.clone_from(database);
        }
        if let Some(path) = &overrides.dump_file {
            self.dump_file.clone_from(path);
        }
        if let Some(path) = &overrides.mysqldump {
            self.tools.mysqldump.clone_from(path);
        }
        if let Some(path) = &overrides.sqlite3 {
            self.tools.sqlite3.clone_from(path);
        }
        if let Some(encoding) = overrides.encoding {
            self.encoding = encoding;
        }
        if let Some(importer) = overrides.importer {
            self.importer = importer;
        }
        if overrides.timeout_secs.is_some() {
            self.timeout_secs = overrides.timeout_secs;
        }
        if overrides.no_verify {
            self.verify = false;
        }
        if overrides.no_restore {
            self.restore_on_failure = false;
        }
    }

    /// Check the settings a full export needs.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Config`] naming the first missing setting.
    pub fn validate(&self) -> Result<()> {
        if self.mysql.database.trim().is_empty() {
            return Err(ConvertError::Config(
                "mysql.database is required (set it in the config file, MYSQL2SQLITE_DATABASE or --database)".to_string(),
            ));
        }
        if self.mysql.host.trim().is_empty() {
            return Err(ConvertError::Config("mysql.host cannot be empty".to_string()));
        }
        if self.dump_file.as_os_str().is_empty() {
            return Err(ConvertError::Config("dump_file cannot be empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConvertError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy safe to print: the password is masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.mysql.password.is_empty() {
            copy.mysql.password = REDACTED.to_string();
        }
        copy
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConvertError::Config(format!("{name}={value}: {e}")))
}
