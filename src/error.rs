//! Conversion error taxonomy.
//!
//! Every fatal problem found while converting a document is a [`ConvertError`].
//! Non-fatal problems found while importing preset JSON are reported as
//! [`Diagnostic`](crate::parser::preset_json::Diagnostic)s instead.

use std::fmt;
use thiserror::Error;

/// Result alias for the conversion core.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Where in the source document a row came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLocation {
    /// Enclosing `##` section name
    pub section: String,
    /// 1-based line number in the original document
    pub line: usize,
}

impl RowLocation {
    /// Creates a new location.
    pub fn new(section: impl Into<String>, line: usize) -> Self {
        Self {
            section: section.into(),
            line,
        }
    }
}

impl fmt::Display for RowLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section '{}', line {}", self.section, self.line)
    }
}

/// Fatal conversion errors. Any of these aborts the run before output is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// The document contains no recognisable control table at all.
    #[error("structural error: {0}")]
    Structural(String),

    /// Unparseable address, envelope arity mismatch or unknown device index.
    #[error("address error in {location}: {message}")]
    Address {
        /// Offending row
        location: RowLocation,
        /// What went wrong
        message: String,
    },

    /// Malformed range, or a choice value or group span that does not fit.
    #[error("range error in {location}: {message}")]
    Range {
        /// Offending row
        location: RowLocation,
        /// What went wrong
        message: String,
    },

    /// Color cell that is not a 6-digit hex color.
    #[error("invalid color '{value}' in {location}")]
    Color {
        /// Offending row
        location: RowLocation,
        /// The raw cell contents
        value: String,
    },

    /// Frontmatter that could not be parsed or holds invalid values.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Reverse-mode input that is not a preset document.
    #[error("preset JSON error: {0}")]
    Json(String),
}

impl ConvertError {
    /// Builds an [`ConvertError::Address`].
    pub fn address(location: &RowLocation, message: impl Into<String>) -> Self {
        Self::Address {
            location: location.clone(),
            message: message.into(),
        }
    }

    /// Builds an [`ConvertError::Range`].
    pub fn range(location: &RowLocation, message: impl Into<String>) -> Self {
        Self::Range {
            location: location.clone(),
            message: message.into(),
        }
    }

    /// Returns the offending row, when the error is tied to one.
    #[must_use]
    pub const fn location(&self) -> Option<&RowLocation> {
        match self {
            Self::Address { location, .. }
            | Self::Range { location, .. }
            | Self::Color { location, .. } => Some(location),
            Self::Structural(_) | Self::Metadata(_) | Self::Json(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_row() {
        let err = ConvertError::address(&RowLocation::new("FILTER", 12), "bad token 'Q7'");
        assert_eq!(
            err.to_string(),
            "address error in section 'FILTER', line 12: bad token 'Q7'"
        );
        assert_eq!(err.location().map(|l| l.line), Some(12));
    }

    #[test]
    fn test_structural_error_has_no_location() {
        let err = ConvertError::Structural("no tables".to_string());
        assert!(err.location().is_none());
    }
}
