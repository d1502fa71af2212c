//! Sanitize command implementation.

use crate::cli::SanitizeArgs;
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::pipeline::sanitize_file;

/// Execute the sanitize command.
///
/// # Errors
///
/// Returns an error if the input cannot be read, decoded or written back.
pub fn execute(args: &SanitizeArgs, config: &ConvertConfig, json: bool) -> Result<()> {
    let encoding = args.encoding.unwrap_or(config.encoding);
    let output = args.output.as_deref().unwrap_or(&args.input);

    let stats = sanitize_file(&args.input, output, encoding)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "Sanitized {} -> {}: kept {} of {} lines, dropped {} key lines",
            args.input.display(),
            output.display(),
            stats.lines_written,
            stats.lines_read,
            stats.key_lines_dropped
        );
    }
    Ok(())
}
