//! Config command implementation.

use crate::config::ConvertConfig;
use crate::error::Result;

/// Print the effective configuration with the password masked.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn execute(config: &ConvertConfig, json: bool) -> Result<()> {
    let shown = config.redacted();
    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print!("{}", serde_yaml::to_string(&shown)?);
    }
    Ok(())
}
