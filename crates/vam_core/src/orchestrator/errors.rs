//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Operation → Detail

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::tool::ToolError;

/// How a failure counts towards a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Nothing was attempted; the job is skipped.
    Precondition,
    /// An external tool failed or could not be run.
    Invocation,
    /// Anything else.
    Unexpected,
}

impl ErrorClass {
    /// Whether a job failing this way counts as skipped rather than failed.
    pub fn is_skip(&self) -> bool {
        matches!(self, ErrorClass::Precondition)
    }
}

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Failed to set up the job (create directories, etc.).
    #[error("Job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::StepFailed { source, .. } => source.classify(),
            Self::SetupFailed { .. } => ErrorClass::Unexpected,
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// An external command exited non-zero.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The external program is missing.
    #[error("{tool} not found (is it installed and on PATH?)")]
    ToolNotFound { tool: String },

    /// The external program outlived its time bound.
    #[error("{tool} timed out after {}s", .limit.as_secs_f64())]
    Timeout { tool: String, limit: Duration },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required input file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Taxonomy bucket of this error.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::PreconditionFailed(_) | Self::InvalidInput(_) | Self::FileNotFound { .. } => {
                ErrorClass::Precondition
            }
            Self::CommandFailed { .. } | Self::ToolNotFound { .. } | Self::Timeout { .. } => {
                ErrorClass::Invocation
            }
            Self::InvalidOutput(_) | Self::IoError { .. } | Self::Other(_) => {
                ErrorClass::Unexpected
            }
        }
    }
}

impl From<ToolError> for StepError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound { program } => Self::ToolNotFound { tool: program },
            ToolError::Timeout { program, limit } => Self::Timeout {
                tool: program,
                limit,
            },
            ToolError::Failed {
                program,
                exit_code,
                message,
            } => Self::command_failed(program, exit_code, message),
            ToolError::Io { program, source } => {
                Self::io_error(format!("running {}", program), source)
            }
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_displays_context() {
        let err = StepError::command_failed("ffmpeg", 1, "Invalid data found");
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg"));
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("Invalid data found"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::file_not_found("/media/missing.mp4");
        let pipeline_err = PipelineError::step_failed("intro", "Plan", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("intro"));
        assert!(msg.contains("Plan"));
    }

    #[test]
    fn classification_follows_taxonomy() {
        assert_eq!(
            StepError::precondition_failed("no audio").classify(),
            ErrorClass::Precondition
        );
        assert_eq!(StepError::invalid_input("bad").classify(), ErrorClass::Precondition);
        assert_eq!(
            StepError::command_failed("ffmpeg", 1, "x").classify(),
            ErrorClass::Invocation
        );
        assert_eq!(
            StepError::from(ToolError::NotFound {
                program: "ffmpeg".into()
            })
            .classify(),
            ErrorClass::Invocation
        );
        assert_eq!(
            StepError::from(ToolError::Timeout {
                program: "ffmpeg".into(),
                limit: Duration::from_secs(1)
            })
            .classify(),
            ErrorClass::Invocation
        );
        assert_eq!(StepError::invalid_output("missing").classify(), ErrorClass::Unexpected);
        assert!(ErrorClass::Precondition.is_skip());
        assert!(!PipelineError::setup_failed("j", "x").classify().is_skip());
    }
}
