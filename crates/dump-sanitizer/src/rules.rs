//! Line-level rewrite rules.
//!
//! Each rule takes one trimmed dump line and returns the rewritten line
//! together with how many times it fired. Rules never look at neighbouring
//! lines; the cross-line comma repair lives in [`crate::buffer`].

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Substring that marks an index or key clause.
pub const KEY_MARKER: &str = "KEY";

const UNSIGNED: &str = " unsigned";
const ESCAPED_QUOTE: &str = "\\'";
const DOUBLED_QUOTE: &str = "''";

static COLLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\bCOLLATE\s+[^\s,;()]+").expect("static regex must compile")
});

static CHARACTER_SET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\bCHARACTER\s+SET\s+[^\s,;()]+").expect("static regex must compile")
});

/// Returns `true` when the line carries a key/index clause and must be dropped.
#[must_use]
pub fn is_key_line(line: &str) -> bool {
    line.contains(KEY_MARKER)
}

/// Returns `true` when the line closes a column/key block.
#[must_use]
pub fn closes_block(line: &str) -> bool {
    line.starts_with(')')
}

/// Remove every `COLLATE <name>` clause.
///
/// The name is one whitespace-delimited token, quoted or not. A `,` `;`
/// `(` or `)` ends it and stays on the line.
#[must_use]
pub fn strip_collate(line: &str) -> (Cow<'_, str>, usize) {
    strip_clause(&COLLATE_RE, line)
}

/// Remove every `CHARACTER SET <name>` clause.
#[must_use]
pub fn strip_character_set(line: &str) -> (Cow<'_, str>, usize) {
    strip_clause(&CHARACTER_SET_RE, line)
}

/// Remove the ` unsigned` integer qualifier.
#[must_use]
pub fn strip_unsigned(line: &str) -> (Cow<'_, str>, usize) {
    replace_literal(line, UNSIGNED, "")
}

/// Rewrite MySQL `\'` escapes as ANSI doubled quotes.
#[must_use]
pub fn rewrite_escaped_quotes(line: &str) -> (Cow<'_, str>, usize) {
    replace_literal(line, ESCAPED_QUOTE, DOUBLED_QUOTE)
}

fn strip_clause<'a>(re: &Regex, line: &'a str) -> (Cow<'a, str>, usize) {
    let count = re.find_iter(line).count();
    if count == 0 {
        return (Cow::Borrowed(line), 0);
    }
    (re.replace_all(line, ""), count)
}

fn replace_literal<'a>(line: &'a str, from: &str, to: &str) -> (Cow<'a, str>, usize) {
    let count = line.matches(from).count();
    if count == 0 {
        (Cow::Borrowed(line), 0)
    } else {
        (Cow::Owned(line.replace(from, to)), count)
    }
}
