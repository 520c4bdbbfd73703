use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow scripts to distinguish a missing artifact from
/// a broken invocation or an infrastructure failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - the command completed
    Success = 0,
    /// The requested coordinate does not exist in the registry
    NotFound = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (network error, storage error, file I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Picks the exit code for an error returned by a command
    pub fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<AnalysisError>() {
            Some(AnalysisError::NotFound { .. }) => ExitCode::NotFound,
            Some(AnalysisError::Validation { .. }) => ExitCode::InvalidArguments,
            _ => ExitCode::ApplicationError,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::NotFound => write!(f, "Not Found (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Failure taxonomy shared by every collaborator of the analysis engine.
///
/// Collaborators return `anyhow::Error` values wrapping one of these variants,
/// and the orchestrator classifies them with `downcast_ref`. Only
/// `TooManyResults` is allowed to escape a single coordinate's analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Artifact not found: {subject}\n\n💡 Hint: Check the coordinate spelling (group:artifact:version[:classifier])")]
    NotFound { subject: String },

    #[error("Invalid data for {subject}: {details}")]
    Invalid { subject: String, details: String },

    #[error("Transient failure for {subject} after {attempts} attempt(s): {details}")]
    Transient {
        subject: String,
        attempts: u32,
        details: String,
    },

    #[error("Storage integrity violation: {details}")]
    TooManyResults { details: String },

    #[error("Hard dependency cycle detected: {cycle}")]
    Cycle { cycle: String },

    /// Validation error for coordinates, configuration and builder input
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Failed to access store file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the path exists and you have the required permissions")]
    StoreFile { path: PathBuf, details: String },

    #[error("Failed to write output file: {path}\nDetails: {details}")]
    OutputFile { path: PathBuf, details: String },
}

impl AnalysisError {
    pub fn not_found(subject: impl fmt::Display) -> Self {
        AnalysisError::NotFound {
            subject: subject.to_string(),
        }
    }

    pub fn invalid(subject: impl fmt::Display, details: impl Into<String>) -> Self {
        AnalysisError::Invalid {
            subject: subject.to_string(),
            details: details.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AnalysisError::Validation {
            message: message.into(),
        }
    }

    /// Returns true for errors that must abort the whole operation instead of
    /// being recorded as an unresolved package.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::TooManyResults { .. })
    }

    /// Returns true if `error` wraps an `AnalysisError` that must propagate.
    pub fn is_fatal_error(error: &anyhow::Error) -> bool {
        error
            .downcast_ref::<AnalysisError>()
            .is_some_and(AnalysisError::is_fatal)
    }
}
