//! Document decoders.
//!
//! Turns one textual configuration document into one [`ConfigFragment`].
//! Two formats are supported, JSON and TOML, and both decode into the same
//! sparse shape: keys missing from the document stay absent.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::fragment::ConfigFragment;

/// Label used in errors for documents that did not come from a file.
const INLINE_SOURCE: &str = "<inline>";

/// Textual format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Guess the format from the document text. A document whose first
    /// non-whitespace character is `{` is JSON, anything else is TOML.
    #[must_use]
    pub fn sniff(text: &str) -> Self {
        if text.trim_start().starts_with('{') {
            Self::Json
        } else {
            Self::Toml
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Toml => write!(f, "toml"),
        }
    }
}

/// Decode one document in the given format.
///
/// # Errors
///
/// Returns [`ConfigError::JsonError`] or [`ConfigError::TomlError`] on a
/// syntax error or when a value has the wrong type for its field.
pub fn parse_file(text: &str, format: DocumentFormat) -> ConfigResult<ConfigFragment> {
    parse_file_at(text, format, INLINE_SOURCE)
}

/// Decode one document, sniffing its format.
///
/// # Errors
///
/// See [`parse_file`].
pub fn parse_document(text: &str) -> ConfigResult<ConfigFragment> {
    parse_file(text, DocumentFormat::sniff(text))
}

/// Decode one document, labelling errors with `source`.
pub(crate) fn parse_file_at(
    text: &str,
    format: DocumentFormat,
    source: &str,
) -> ConfigResult<ConfigFragment> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| ConfigError::JsonError {
            path: source.to_owned(),
            source: e,
        }),
        DocumentFormat::Toml => toml::from_str(text).map_err(|e| ConfigError::TomlError {
            path: source.to_owned(),
            source: e,
        }),
    }
}
