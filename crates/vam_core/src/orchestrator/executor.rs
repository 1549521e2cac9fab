//! Mixdown executor: runs one job end to end.

use std::path::PathBuf;
use std::sync::Arc;

use super::errors::PipelineError;
use super::outcome::{JobOutcome, JobReport};
use super::pipeline::Pipeline;
use super::steps::{ExtendStep, MixdownStep, PlanStep};
use super::types::{Context, JobState};
use crate::config::Settings;
use crate::logging::{GuiLogCallback, JobLogger, LogConfig};
use crate::models::MixSession;
use crate::plan::{ArtifactScope, MixPlan};
use crate::tool::{MediaTool, ProcessTool};

/// Receives every job log line as `(job_name, line)`.
pub type JobLogSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Receives step progress as `(job_name, step_name, percent, message)`.
pub type StepProgressSink = Arc<dyn Fn(&str, &str, u32, &str) + Send + Sync>;

/// Runs `Plan → Extend → Mixdown` for one session.
///
/// Every temp file the job registers is deleted before the report is
/// returned, whatever the outcome. A panic unwinding through the executor
/// still removes them through the artifact guard's `Drop`.
pub struct MixExecutor {
    tool: Arc<dyn MediaTool>,
    settings: Settings,
    log_dir: Option<PathBuf>,
    log_sink: Option<JobLogSink>,
    step_progress: Option<StepProgressSink>,
}

impl MixExecutor {
    pub fn new(tool: Arc<dyn MediaTool>, settings: Settings) -> Self {
        Self {
            tool,
            settings: settings.sanitized(),
            log_dir: None,
            log_sink: None,
            step_progress: None,
        }
    }

    /// Executor using the configured ffmpeg and invocation timeout.
    pub fn from_settings(settings: Settings) -> Self {
        let tool = ProcessTool::ffmpeg(&settings.tools.ffmpeg).with_timeout(settings.tools.timeout());
        Self::new(Arc::new(tool), settings)
    }

    /// Write one log file per job into `dir`.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Forward job log lines to `sink`.
    pub fn with_log_sink(mut self, sink: JobLogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Forward per-step progress of every job to `sink`.
    pub fn with_step_progress(mut self, sink: StepProgressSink) -> Self {
        self.step_progress = Some(sink);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tool(&self) -> &Arc<dyn MediaTool> {
        &self.tool
    }

    /// Plan and execute `session`, writing `session.target_output`.
    pub fn run(&self, session: MixSession) -> JobReport {
        self.run_job(session, None)
    }

    /// Execute a plan built beforehand; its output goes to `session.target_output`.
    pub fn execute(&self, session: MixSession, plan: MixPlan) -> JobReport {
        self.run_job(session, Some(plan))
    }

    /// Steps of a mix job.
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new()
            .with_step(PlanStep::new().allow_empty(!self.settings.batch.skip_without_clips))
            .with_step(ExtendStep::new())
            .with_step(MixdownStep::new())
    }

    fn run_job(&self, session: MixSession, plan: Option<MixPlan>) -> JobReport {
        let job_name = session.video.stem();
        let video = session.video.path.clone();
        let scope = job_scope(&self.settings, &job_name);
        let logger = Arc::new(job_logger(
            &job_name,
            &scope,
            &self.settings,
            self.log_dir.as_ref(),
            self.log_sink.as_ref(),
        ));
        let log_path = logger.log_path().map(PathBuf::from);

        if let Err(e) = prepare_scope(&scope, &job_name) {
            logger.error(&e.to_string());
            logger.close();
            return JobReport {
                job_name,
                video,
                outcome: JobOutcome::from_error(&e),
                steps_completed: Vec::new(),
                artifacts_removed: 0,
                log_path,
            };
        }

        logger.phase(&format!("Job: {}", job_name));
        tracing::info!("Starting mix job {}", job_name);

        let mut ctx = Context::new(
            session,
            self.settings.clone(),
            scope,
            Arc::clone(&logger),
            Arc::clone(&self.tool),
        );
        if let Some(sink) = &self.step_progress {
            let sink = Arc::clone(sink);
            let name = job_name.clone();
            ctx = ctx.with_progress_callback(Box::new(move |step: &str, percent: u32, message: &str| {
                sink(&name, step, percent, message)
            }));
        }
        let mut state = JobState::new(uuid::Uuid::new_v4().to_string());
        if let Some(plan) = plan {
            state = state.with_plan(plan);
        }

        let result = self.pipeline().run(&ctx, &mut state);
        let artifacts_removed = ctx.artifacts.cleanup();
        if artifacts_removed > 0 {
            logger.debug(&format!("Removed {} temp file(s)", artifacts_removed));
        }

        let (outcome, steps_completed) = match result {
            Ok(run) => {
                let output = state
                    .mixdown
                    .map(|m| m.output_path)
                    .unwrap_or_else(|| ctx.session.target_output.clone());
                tracing::info!("Mix job {} succeeded: {}", job_name, output.display());
                (JobOutcome::Succeeded { output }, run.steps_completed)
            }
            Err(e) => {
                let outcome = JobOutcome::from_error(&e);
                match &outcome {
                    JobOutcome::Skipped { reason } => {
                        logger.info(&format!("Skipped: {}", reason));
                        tracing::info!("Mix job {} skipped: {}", job_name, reason);
                    }
                    _ => tracing::warn!("Mix job {} failed: {}", job_name, e),
                }
                (outcome, Vec::new())
            }
        };
        logger.close();

        JobReport {
            job_name,
            video,
            outcome,
            steps_completed,
            artifacts_removed,
            log_path,
        }
    }
}

/// Logger for one job: `<log_dir>/<stem>_<token>.log` when a directory is
/// given, otherwise in memory.
pub(crate) fn job_logger(
    job_name: &str,
    scope: &ArtifactScope,
    settings: &Settings,
    log_dir: Option<&PathBuf>,
    sink: Option<&JobLogSink>,
) -> JobLogger {
    let config = LogConfig::from(&settings.logging);
    let callback: Option<GuiLogCallback> = sink.map(|sink| {
        let sink = Arc::clone(sink);
        let name = job_name.to_string();
        Box::new(move |line: &str| sink(&name, line)) as GuiLogCallback
    });

    match log_dir {
        Some(dir) => {
            match JobLogger::with_file_stem(job_name, dir, &scope.job_stem(), config.clone(), callback) {
                Ok(logger) => logger,
                Err(e) => {
                    tracing::warn!("Cannot open job log in {}: {}", dir.display(), e);
                    JobLogger::in_memory(job_name, config)
                }
            }
        }
        None => JobLogger::in_memory(job_name, config),
    }
}

/// Fresh artifact scope under the configured temp root.
pub(crate) fn job_scope(settings: &Settings, job_name: &str) -> ArtifactScope {
    ArtifactScope::new(PathBuf::from(&settings.paths.temp_root), job_name)
}

/// Create the scope's work directory.
pub(crate) fn prepare_scope(scope: &ArtifactScope, job_name: &str) -> Result<(), PipelineError> {
    std::fs::create_dir_all(scope.work_dir()).map_err(|e| {
        PipelineError::setup_failed(
            job_name,
            format!("cannot create temp folder {}: {}", scope.work_dir().display(), e),
        )
    })
}
