//! Error handling for the render application.
//! Defines the crate error type, its exit-status classification and the
//! default handler used by the binary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit categories reported by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    RuntimeError,
    UsageError,
    InputValidation,
    PermissionDenied,
    OutputConflict,
    SafetyViolation,
}

impl ExitStatus {
    /// Numeric process exit code for this category.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::RuntimeError => 1,
            ExitStatus::UsageError => 2,
            ExitStatus::InputValidation => 3,
            ExitStatus::PermissionDenied => 4,
            ExitStatus::OutputConflict => 5,
            ExitStatus::SafetyViolation => 6,
        }
    }
}

/// Custom error types for render operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Plain filesystem failure without a more specific context.
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Filesystem failure tied to a specific path.
    #[error("IO error at '{}': {source}.", .path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Usage error: {0}.")]
    UsageError(String),

    /// Missing template or data source.
    #[error("Input error: {0}.")]
    InputError(String),

    /// Unparseable data file or unsupported data format.
    #[error("Data error: {0}.")]
    DataError(String),

    /// Query expression that does not parse or compile.
    #[error("Invalid query '{expression}': {reason}.")]
    QuerySyntaxError { expression: String, reason: String },

    /// Query expression that failed while running against the data.
    #[error("Query error: {0}.")]
    QueryError(String),

    /// Invalid control file.
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Template that failed to compile or execute.
    #[error("Failed to render {template}: {source}.")]
    RenderError {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Template error: {0}.")]
    TemplateError(String),

    /// Two planned outputs share the same destination.
    #[error(
        "Output path collision: '{}' produced by both:\n  - {first}\n  - {second}",
        .output_path.display()
    )]
    CollisionError { output_path: PathBuf, first: String, second: String },

    /// One or more plans failed validation; carries every problem found.
    #[error("Validation failed with {} error(s).", .0.len())]
    PlanValidationError(Vec<Error>),

    #[error("File already exists (use --force to overwrite): '{}'.", .path.display())]
    OutputConflictError { path: PathBuf },

    /// Existing destination that is a directory or special file.
    #[error("Path exists but is not a regular file: '{}'.", .path.display())]
    NotAFileError { path: PathBuf },

    /// Path traversal, symlinks or escapes from the output root.
    #[error("Safety violation: {0}.")]
    SafetyError(String),
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn file<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Error::FileError { path: path.into(), source }
    }

    /// Classifies the error into its exit category.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Error::IoError(e) | Error::FileError { source: e, .. }
                if e.kind() == io::ErrorKind::PermissionDenied =>
            {
                ExitStatus::PermissionDenied
            }
            Error::IoError(_) | Error::FileError { .. } => ExitStatus::RuntimeError,
            Error::UsageError(_) => ExitStatus::UsageError,
            Error::InputError(_)
            | Error::DataError(_)
            | Error::QuerySyntaxError { .. }
            | Error::ConfigError(_) => ExitStatus::InputValidation,
            Error::OutputConflictError { .. } => ExitStatus::OutputConflict,
            Error::SafetyError(_) => ExitStatus::SafetyViolation,
            Error::QueryError(_)
            | Error::RenderError { .. }
            | Error::TemplateError(_)
            | Error::CollisionError { .. }
            | Error::PlanValidationError(_)
            | Error::NotAFileError { .. } => ExitStatus::RuntimeError,
        }
    }
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that reports the error and exits the program.
///
/// In JSON mode the error is printed to stdout as a report object so that
/// callers parsing stdout always receive a document.
pub fn default_error_handler(err: Error, json: bool) -> ! {
    if json {
        let report = crate::report::Report::failure(&err);
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(_) => eprintln!("{err}"),
        }
    } else {
        if let Error::PlanValidationError(errors) = &err {
            for e in errors {
                eprintln!("Error: {e}");
            }
        }
        eprintln!("{err}");
    }
    std::process::exit(err.exit_status().code());
}
