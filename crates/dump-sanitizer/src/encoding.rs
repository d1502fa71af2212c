//! Source encodings a dump may arrive in.
//!
//! `mysqldump` writes bytes in whatever character set the connection used.
//! Legacy exports are Windows-1252; everything is transcoded to UTF-8
//! before the line scan.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use encoding_rs::{Encoding, WINDOWS_1252};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SanitizeError};

/// Character encoding of the raw dump bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceEncoding {
    /// Windows code page 1252.
    #[default]
    #[serde(rename = "windows-1252", alias = "cp1252")]
    Windows1252,
    /// ISO-8859-1, every byte maps to the code point of the same value.
    #[serde(alias = "iso-8859-1")]
    Latin1,
    /// Already UTF-8; validated strictly.
    #[serde(alias = "utf-8")]
    Utf8,
}

impl SourceEncoding {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows1252 => "windows-1252",
            Self::Latin1 => "latin1",
            Self::Utf8 => "utf8",
        }
    }

    /// Decode raw dump bytes into UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`SanitizeError::Encoding`] when `bytes` contains a sequence
    /// that is invalid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<Cow<'_, str>> {
        match self {
            Self::Windows1252 => decode_with(WINDOWS_1252, self, bytes),
            Self::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| SanitizeError::Encoding {
                    encoding: self,
                    offset: e.valid_up_to(),
                }),
        }
    }
}

fn decode_with<'a>(
    codec: &'static Encoding,
    encoding: SourceEncoding,
    bytes: &'a [u8],
) -> Result<Cow<'a, str>> {
    // Every byte is mapped in the WHATWG windows-1252 table.
    codec
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(SanitizeError::Encoding {
            encoding,
            offset: 0,
        })
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows-1252" | "windows1252" | "cp1252" => Ok(Self::Windows1252),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Self::Latin1),
            "utf8" | "utf-8" => Ok(Self::Utf8),
            other => Err(format!(
                "unknown encoding '{other}' (expected one of: windows-1252, latin1, utf8)"
            )),
        }
    }
}
