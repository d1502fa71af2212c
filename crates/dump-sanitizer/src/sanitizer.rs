//! The dump scan: decode, filter, rewrite and re-join.

use serde::{Deserialize, Serialize};

use crate::buffer::OutputBuffer;
use crate::encoding::SourceEncoding;
use crate::error::{Result, SanitizeError};
use crate::rules;

/// Newline convention of a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detect the convention used by `text`. Any `\r\n` makes it CRLF.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Counters collected during one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeStats {
    pub lines_read: usize,
    pub lines_written: usize,
    pub key_lines_dropped: usize,
    pub trailing_commas_removed: usize,
    pub collations_removed: usize,
    pub character_sets_removed: usize,
    pub unsigned_removed: usize,
    pub quotes_rewritten: usize,
}

/// Result of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    /// UTF-8 dump text ready for SQLite.
    pub text: String,
    pub line_ending: LineEnding,
    pub stats: SanitizeStats,
}

/// Rewrites mysqldump output so SQLite accepts it.
///
/// The only setting is the encoding of the raw input; the rewrite itself is
/// fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sanitizer {
    encoding: SourceEncoding,
}

impl Sanitizer {
    #[must_use]
    pub const fn new(encoding: SourceEncoding) -> Self {
        Self { encoding }
    }

    /// Decode `raw` and sanitize it.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::Encoding`] if `raw` cannot be decoded and
    /// [`SanitizeError::MalformedDump`] if a block is closed before anything
    /// was retained.
    pub fn sanitize(&self, raw: &[u8]) -> Result<Sanitized> {
        let text = self.encoding.decode(raw)?;
        self.sanitize_str(&text)
    }

    /// Sanitize already-decoded dump text.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::MalformedDump`] if a line starting with `)`
    /// has no retained non-blank line before it.
    pub fn sanitize_str(&self, text: &str) -> Result<Sanitized> {
        let line_ending = LineEnding::detect(text);
        let mut stats = SanitizeStats::default();
        let mut output = OutputBuffer::with_capacity(text.len() / 64);

        for (idx, raw_line) in text.split('\n').enumerate() {
            stats.lines_read += 1;
            let line = raw_line.trim();

            if rules::is_key_line(line) {
                tracing::trace!(line_no = idx + 1, "Dropping key line: {line}");
                stats.key_lines_dropped += 1;
                continue;
            }

            if rules::closes_block(line) {
                let removed = output
                    .strip_trailing_commas()
                    .ok_or(SanitizeError::MalformedDump { line: idx + 1 })?;
                stats.trailing_commas_removed += removed;
            }

            let (line, n) = rules::strip_collate(line);
            stats.collations_removed += n;
            let (line, n) = rules::strip_character_set(&line);
            stats.character_sets_removed += n;
            let (line, n) = rules::strip_unsigned(&line);
            stats.unsigned_removed += n;
            let (line, n) = rules::rewrite_escaped_quotes(&line);
            stats.quotes_rewritten += n;

            output.push(line.into_owned());
        }

        stats.lines_written = stats.lines_read - stats.key_lines_dropped;
        tracing::debug!(
            lines_read = stats.lines_read,
            lines_written = stats.lines_written,
            key_lines_dropped = stats.key_lines_dropped,
            trailing_commas_removed = stats.trailing_commas_removed,
            "Sanitized dump"
        );

        Ok(Sanitized {
            text: output.join(line_ending.as_str()),
            line_ending,
            stats,
        })
    }
}

/// Sanitize raw Windows-1252 dump bytes.
///
/// # Errors
///
/// See [`Sanitizer::sanitize`].
pub fn sanitize(raw: &[u8]) -> Result<Sanitized> {
    Sanitizer::default().sanitize(raw)
}

/// Sanitize already-decoded dump text.
///
/// # Errors
///
/// See [`Sanitizer::sanitize_str`].
pub fn sanitize_str(text: &str) -> Result<Sanitized> {
    Sanitizer::default().sanitize_str(text)
}
