//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::artifacts::TempArtifacts;
use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::MixSession;
use crate::plan::{ArtifactScope, MixPlan};
use crate::tool::MediaTool;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Mutable results go in [`JobState`]. The artifact guard is interior-mutable
/// so steps can register files they are about to create.
pub struct Context {
    /// Video, clips, configuration and target path.
    pub session: MixSession,
    /// Application settings (sanitized).
    pub settings: Settings,
    /// Job name used in logs.
    pub job_name: String,
    /// Names for this job's intermediate files.
    pub scope: ArtifactScope,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Transcoding tool.
    pub tool: Arc<dyn MediaTool>,
    /// Files to delete when the job ends.
    pub artifacts: TempArtifacts,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(
        session: MixSession,
        settings: Settings,
        scope: ArtifactScope,
        logger: Arc<JobLogger>,
        tool: Arc<dyn MediaTool>,
    ) -> Self {
        Self {
            job_name: logger.job_name().to_string(),
            session,
            settings,
            scope,
            logger,
            tool,
            artifacts: TempArtifacts::new(),
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }
}

/// Mutable job state that accumulates results from pipeline steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// The plan (from the Plan step, or supplied by the caller).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<MixPlan>,
    /// Extension results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extend: Option<ExtendOutput>,
    /// Final mux results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixdown: Option<MixdownOutput>,
    /// Preview render results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Start from a plan built elsewhere.
    pub fn with_plan(mut self, plan: MixPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    /// Picture source for the final invocation: the extended video if one was produced.
    pub fn video_input(&self) -> Option<&PathBuf> {
        self.extend
            .as_ref()
            .map(|e| &e.extended_video)
            .or_else(|| self.plan.as_ref().and_then(|p| p.video_input()))
    }
}

/// Output from the Extend step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendOutput {
    /// Source video with the black segment appended.
    pub extended_video: PathBuf,
    /// Seconds of black appended.
    pub black_secs: f64,
}

/// Output from the Mixdown step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixdownOutput {
    pub output_path: PathBuf,
    pub exit_code: i32,
    /// Command line that was run.
    pub command: String,
}

/// Output from the preview render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewOutput {
    pub window_file: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (nothing to do, not an error).
    Skipped(String),
}
