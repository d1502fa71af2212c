//! `dump-sanitizer` — rewrites mysqldump output into SQLite-compatible SQL.
//!
//! Pure text transform, no I/O. The dump is expected to come from
//! `mysqldump --compatible=ansi --skip-create-options --skip-extended-insert
//! --compact --single-transaction`; anything else is out of scope.
//!
//! Rules, applied per trimmed line in order:
//!
//! - lines containing `KEY` are dropped
//! - a line starting with `)` strips trailing commas from the previous
//!   retained line
//! - `COLLATE <name>` and `CHARACTER SET <name>` clauses are removed
//! - ` unsigned` is removed
//! - `\'` becomes `''`
//!
//! # Quick Start
//!
//! ```
//! use dump_sanitizer::sanitize_str;
//!
//! let dump = "CREATE TABLE \"t\" (\n  \"id\" int unsigned,\n  KEY \"id\" (\"id\")\n);";
//! let out = sanitize_str(dump).unwrap();
//! assert_eq!(out.text, "CREATE TABLE \"t\" (\n\"id\" int\n);");
//! ```

pub mod buffer;
pub mod encoding;
pub mod error;
pub mod rules;
pub mod sanitizer;

pub use buffer::OutputBuffer;
pub use encoding::SourceEncoding;
pub use error::{Result, SanitizeError};
pub use sanitizer::{LineEnding, SanitizeStats, Sanitized, Sanitizer, sanitize, sanitize_str};
