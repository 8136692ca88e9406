//! Error types for libpack.
//!
//! Library crates use [`LibpackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all libpack operations.
#[derive(Debug, thiserror::Error)]
pub enum LibpackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A source file could not be parsed (e.g. a malformed style block).
    #[error("parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// An external process failed to spawn or exited unsuccessfully.
    #[error("process `{program}` failed: {message}")]
    Process { program: String, message: String },

    /// An external process exceeded its time budget and was killed.
    #[error("process `{program}` timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// Data validation error (invalid identifier, duplicate export block, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A background task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(String),

    /// A pipeline stage reported one or more failures.
    #[error("stage `{stage}` failed with {} failure(s)", .failures.len())]
    Stage {
        stage: String,
        failures: Vec<String>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LibpackError>;

impl LibpackError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error for a specific file.
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a process error for the given program.
    pub fn process(program: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Process {
            program: program.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
