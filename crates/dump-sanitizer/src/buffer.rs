//! Growable buffer of retained dump lines.

/// Ordered lines kept after filtering.
///
/// Only the most recent non-blank line may be edited after it was pushed,
/// and only by [`OutputBuffer::strip_trailing_commas`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    lines: Vec<String>,
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Strip trailing `,` from the most recent non-blank line.
    ///
    /// Blank lines pushed after it are skipped. Returns `None` when no
    /// non-blank line has been retained yet, otherwise the number of commas
    /// removed.
    pub fn strip_trailing_commas(&mut self) -> Option<usize> {
        let last = self
            .lines
            .iter_mut()
            .rev()
            .find(|line| !line.trim().is_empty())?;

        let kept = last.trim_end_matches(',').len();
        let removed = last.len() - kept;
        last.truncate(kept);
        Some(removed)
    }

    /// Join the retained lines with `separator`.
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        self.lines.join(separator)
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
