//! Shared CLI plumbing: error type and process exit codes.

use crate::error::ConvertError;
use std::fmt;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Conversion succeeded (reverse runs with diagnostics included)
    Success = 0,
    /// The input document is invalid
    ValidationError = 1,
    /// A file could not be read or written
    IoError = 2,
}

impl ExitCode {
    /// Numeric code handed to the operating system.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error returned by CLI commands, carrying its exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Message printed to stderr
    pub message: String,
    /// Exit code for the process
    pub exit_code: ExitCode,
}

impl CliError {
    /// Invalid input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::ValidationError,
        }
    }

    /// File system failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: ExitCode::IoError,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConvertError> for CliError {
    fn from(err: ConvertError) -> Self {
        Self::validation(err.to_string())
    }
}

/// Result alias for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowLocation;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(CliError::validation("bad").exit_code.code(), 1);
        assert_eq!(CliError::io("gone").exit_code.code(), 2);
    }

    #[test]
    fn test_convert_errors_are_validation_failures() {
        let err: CliError = ConvertError::range(&RowLocation::new("OSC", 4), "10-5").into();
        assert_eq!(err.exit_code, ExitCode::ValidationError);
        assert!(err.message.contains("line 4"));
    }
}
