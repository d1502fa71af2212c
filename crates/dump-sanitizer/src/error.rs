//! Error types for `dump-sanitizer`.

use thiserror::Error;

use crate::encoding::SourceEncoding;

/// Errors raised while sanitizing a dump.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    /// The raw dump bytes are not valid in the declared source encoding.
    #[error("Dump is not valid {encoding}: malformed byte sequence at offset {offset}")]
    Encoding {
        encoding: SourceEncoding,
        offset: usize,
    },

    /// A closing-parenthesis line appeared before any retained line.
    #[error("Malformed dump at line {line}: ')' has no preceding definition to close")]
    MalformedDump { line: usize },
}

/// Result type using `SanitizeError`.
pub type Result<T> = std::result::Result<T, SanitizeError>;
