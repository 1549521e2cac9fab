//! Per-job outcomes and batch totals.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::{ErrorClass, PipelineError};

/// How one job ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The output was written.
    Succeeded { output: PathBuf },
    /// A precondition failed before any external tool ran.
    Skipped { reason: String },
    /// An invocation failed or something unexpected happened.
    Failed { diagnostic: String },
}

impl JobOutcome {
    /// Map a pipeline error onto skipped or failed.
    pub fn from_error(err: &PipelineError) -> Self {
        match err.classify() {
            ErrorClass::Precondition => Self::Skipped {
                reason: err.to_string(),
            },
            ErrorClass::Invocation | ErrorClass::Unexpected => Self::Failed {
                diagnostic: err.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short label for status columns.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "succeeded",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of one executor run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_name: String,
    pub video: PathBuf,
    pub outcome: JobOutcome,
    /// Steps that completed, in order.
    #[serde(default)]
    pub steps_completed: Vec<String>,
    /// Temp files removed by the final cleanup.
    #[serde(default)]
    pub artifacts_removed: usize,
    /// Job log file, if one was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

/// Running counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTotals {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchTotals {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Succeeded { .. } => self.succeeded += 1,
            JobOutcome::Skipped { .. } => self.skipped += 1,
            JobOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Jobs with an outcome so far.
    pub fn finished(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.finished() >= self.total
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl std::fmt::Display for BatchTotals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} finished: {} succeeded, {} skipped, {} failed",
            self.finished(),
            self.total,
            self.succeeded,
            self.skipped,
            self.failed
        )
    }
}
