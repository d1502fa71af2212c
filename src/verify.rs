//! Post-import checks on the SQLite file.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;

use crate::error::{ConvertError, Result};

/// Row count for one imported table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: u64,
}

/// What verification found in the imported database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifySummary {
    pub integrity: String,
    pub tables: Vec<TableSummary>,
}

impl VerifySummary {
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Open the database read-only, run `PRAGMA integrity_check` and count rows.
///
/// # Errors
///
/// Returns [`ConvertError::Verification`] if the file is missing or the
/// integrity check reports anything but `ok`, and a database error if a
/// query fails.
pub fn verify_database(path: &Path) -> Result<VerifySummary> {
    if !path.is_file() {
        return Err(ConvertError::Verification {
            path: path.to_path_buf(),
            reason: "database file was not created".to_string(),
        });
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut problems = Vec::new();
    for row in rows {
        problems.push(row?);
    }
    let integrity = problems.join("; ");
    if integrity != "ok" {
        return Err(ConvertError::Verification {
            path: path.to_path_buf(),
            reason: integrity,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut tables = Vec::new();
    for name in names {
        let name = name?;
        let quoted = name.replace('"', "\"\"");
        let rows: i64 =
            conn.query_row(&format!("SELECT count(*) FROM \"{quoted}\""), [], |row| row.get(0))?;
        tables.push(TableSummary {
            name,
            rows: u64::try_from(rows).unwrap_or(0),
        });
    }

    tracing::debug!(tables = tables.len(), "Verified {}", path.display());
    Ok(VerifySummary { integrity, tables })
}
