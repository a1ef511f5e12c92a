//! Exit codes and machine-readable error reports.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: finished, duplicates found (or listing only)
/// - 1: fatal error
/// - 2: duplicate check ran and found nothing
/// - 3: finished, but some files could not be scanned, hashed or deleted
/// - 130: interrupted with Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// Unexpected failure.
    GeneralError = 1,
    /// No duplicate groups.
    NoDuplicates = 2,
    /// Completed with non-fatal per-file errors.
    PartialSuccess = 3,
    /// Stopped by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable code string for scripts.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }
}

/// Error report printed on stderr with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code such as "DS001"
    pub code: String,
    /// Process exit code
    pub exit_code: i32,
    /// Error chain, outermost first
    pub message: String,
    /// Whether Ctrl+C caused the exit
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report from an error and the code the process exits with.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
