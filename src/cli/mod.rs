//! Command-line interface for `mysql2sqlite`.
//!
//! This module provides the CLI parsing and command routing using clap.

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dump_sanitizer::SourceEncoding;

use crate::config::{CliOverrides, ConvertConfig, ImporterKind};
use crate::logging;

/// `mysql2sqlite` - turn a MySQL database into a SQLite file.
#[derive(Parser, Debug)]
#[command(name = "mysql2sqlite")]
#[command(
    author,
    version,
    about = "Convert a MySQL database into a SQLite file via mysqldump",
    long_about = None,
    after_help = "Pipeline: mysqldump -> sanitize -> backup existing target to .bk -> import -> verify."
)]
pub struct Cli {
    /// Output format: text (default) or json
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./mysql2sqlite.yaml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append a JSON debug log to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export, sanitize and import a MySQL database into a SQLite file
    Convert(ConvertArgs),

    /// Sanitize an existing mysqldump file
    Sanitize(SanitizeArgs),

    /// Show the effective configuration (password redacted)
    Config(ConnectionArgs),

    /// Show version information
    Version,
}

/// Connection and tool settings shared by `convert` and `config`.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// MySQL host
    #[arg(long)]
    pub host: Option<String>,

    /// MySQL port
    #[arg(long)]
    pub port: Option<u16>,

    /// MySQL user
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// MySQL password (prefer MYSQL2SQLITE_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// MySQL database to export
    #[arg(long, short = 'd')]
    pub database: Option<String>,

    /// Where mysqldump writes the dump (sanitized in place)
    #[arg(long, value_name = "PATH")]
    pub dump_file: Option<PathBuf>,

    /// Path to the mysqldump executable
    #[arg(long, value_name = "PATH")]
    pub mysqldump: Option<PathBuf>,

    /// Path to the sqlite3 executable
    #[arg(long, value_name = "PATH")]
    pub sqlite3: Option<PathBuf>,

    /// Encoding of the mysqldump output (windows-1252, latin1, utf8)
    #[arg(long)]
    pub encoding: Option<SourceEncoding>,

    /// How to load the dump: shell (sqlite3) or embedded
    #[arg(long)]
    pub importer: Option<ImporterKind>,

    /// Kill mysqldump/sqlite3 after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip the post-import integrity check
    #[arg(long)]
    pub no_verify: bool,

    /// Keep the .bk file instead of restoring it when import fails
    #[arg(long)]
    pub no_restore: bool,
}

impl ConnectionArgs {
    #[must_use]
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            dump_file: self.dump_file.clone(),
            mysqldump: self.mysqldump.clone(),
            sqlite3: self.sqlite3.clone(),
            encoding: self.encoding,
            importer: self.importer,
            timeout_secs: self.timeout,
            no_verify: self.no_verify,
            no_restore: self.no_restore,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// SQLite database file to create
    pub target: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Args, Debug)]
pub struct SanitizeArgs {
    /// mysqldump output to sanitize
    pub input: PathBuf,

    /// Write here instead of overwriting the input
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Encoding of the input (default from config, else windows-1252)
    #[arg(long)]
    pub encoding: Option<SourceEncoding>,
}

/// Run the CLI.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    match &cli.command {
        Commands::Convert(args) => {
            let config = ConvertConfig::load(cli.config.as_deref(), &args.connection.to_overrides())?;
            commands::convert::execute(args, &config, cli.json)?;
        }
        Commands::Sanitize(args) => {
            let config = ConvertConfig::load(cli.config.as_deref(), &CliOverrides::default())?;
            commands::sanitize::execute(args, &config, cli.json)?;
        }
        Commands::Config(args) => {
            let config = ConvertConfig::load(cli.config.as_deref(), &args.to_overrides())?;
            commands::config::execute(&config, cli.json)?;
        }
        Commands::Version => commands::version::execute(cli.json)?,
    }

    Ok(())
}
