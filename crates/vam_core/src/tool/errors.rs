//! Errors from running external programs.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failure to run an external program to completion.
///
/// A program that runs and exits non-zero is not an error at this layer;
/// see [`ToolOutput`](super::ToolOutput).
#[derive(Error, Debug)]
pub enum ToolError {
    /// The program is not installed or not on `PATH`.
    #[error("{program} not found (is it installed and on PATH?)")]
    NotFound { program: String },

    /// The process could not be spawned or waited on.
    #[error("I/O error running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process outlived its time bound and was killed.
    #[error("{program} timed out after {}s", .limit.as_secs_f64())]
    Timeout { program: String, limit: Duration },

    /// The program exited non-zero where success was required.
    #[error("{program} failed with exit code {exit_code}: {message}")]
    Failed {
        program: String,
        exit_code: i32,
        message: String,
    },
}

impl ToolError {
    /// Map a spawn error, recognising a missing program.
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        let program = program.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { program }
        } else {
            Self::Io { program, source }
        }
    }

    /// Create an I/O error.
    pub fn io(program: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            program: program.into(),
            source,
        }
    }

    /// Create a failed-exit error.
    pub fn failed(program: impl Into<String>, exit_code: i32, message: impl Into<String>) -> Self {
        Self::Failed {
            program: program.into(),
            exit_code,
            message: message.into(),
        }
    }
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
