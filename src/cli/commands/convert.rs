//! Convert command implementation.

use crate::cli::ConvertArgs;
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::pipeline::{ConversionReport, Converter};
use crate::process::{MysqlDumpExporter, importer_for};

/// Execute the convert command.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or any pipeline
/// stage fails.
pub fn execute(args: &ConvertArgs, config: &ConvertConfig, json: bool) -> Result<()> {
    config.validate()?;

    let converter = Converter::new(
        config,
        MysqlDumpExporter::from_config(config),
        importer_for(config),
    );
    let report = converter.convert(&args.target)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ConversionReport) {
    let stats = &report.sanitize;
    println!("Converted into {}", report.target.display());
    println!(
        "  dump:     {} ({} lines read, {} written)",
        report.dump_file.display(),
        stats.lines_read,
        stats.lines_written
    );
    println!(
        "  removed:  {} key lines, {} trailing commas, {} COLLATE, {} CHARACTER SET, {} unsigned",
        stats.key_lines_dropped,
        stats.trailing_commas_removed,
        stats.collations_removed,
        stats.character_sets_removed,
        stats.unsigned_removed
    );
    println!("  quotes:   {} rewritten", stats.quotes_rewritten);
    if let Some(backup) = &report.backup {
        println!("  backup:   {} ({} bytes)", backup.path.display(), backup.size);
    }
    if let Some(verify) = &report.verify {
        println!(
            "  verified: {} tables, {} rows, integrity {}",
            verify.tables.len(),
            verify.total_rows(),
            verify.integrity
        );
    }
    println!("  elapsed:  {}ms", report.elapsed_ms);
}
