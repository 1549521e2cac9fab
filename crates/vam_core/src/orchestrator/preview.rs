//! Preview variant: render a short window of the mix and play it.

use std::sync::Arc;

use super::artifacts::TempArtifacts;
use super::executor::{job_logger, job_scope, prepare_scope};
use super::outcome::JobOutcome;
use super::pipeline::Pipeline;
use super::steps::{ExtendStep, PlanStep, PreviewRenderStep};
use super::types::{Context, JobState};
use crate::command::PreviewWindow;
use crate::config::Settings;
use crate::models::MixSession;
use crate::tool::{FfplayPlayer, MediaTool, Player, ProcessTool};

/// Result of one preview.
#[derive(Debug, Clone)]
pub struct PreviewReport {
    pub job_name: String,
    pub window: PreviewWindow,
    /// `Succeeded` names the rendered window file, which no longer exists
    /// once playback has ended.
    pub outcome: JobOutcome,
    /// Whether the player was started.
    pub played: bool,
    /// Lines of the preview's log.
    pub log: Vec<String>,
}

/// Renders `Plan → Extend → PreviewRender` and hands the window to a player.
///
/// Extension files are deleted right after the render, before playback
/// starts. The window file is deleted once the player returns.
pub struct PreviewRunner {
    tool: Arc<dyn MediaTool>,
    player: Arc<dyn Player>,
    settings: Settings,
}

impl PreviewRunner {
    pub fn new(tool: Arc<dyn MediaTool>, player: Arc<dyn Player>, settings: Settings) -> Self {
        Self {
            tool,
            player,
            settings: settings.sanitized(),
        }
    }

    /// Runner using the configured ffmpeg and ffplay.
    pub fn from_settings(settings: Settings) -> Self {
        let tool = ProcessTool::ffmpeg(&settings.tools.ffmpeg).with_timeout(settings.tools.timeout());
        let player = FfplayPlayer::new(&settings.tools.ffplay);
        Self::new(Arc::new(tool), Arc::new(player), settings)
    }

    /// Window from the `[preview]` settings.
    pub fn default_window(&self) -> PreviewWindow {
        PreviewWindow::new(
            self.settings.preview.start_secs,
            self.settings.preview.duration_secs,
        )
    }

    pub fn pipeline(&self, window: PreviewWindow) -> Pipeline {
        Pipeline::new()
            .with_step(PlanStep::new().allow_empty(true))
            .with_step(ExtendStep::new().with_geometry_fallback())
            .with_step(PreviewRenderStep::new(window))
    }

    /// Render `window` of `session`'s mix, play it, and block until playback ends.
    pub fn preview(&self, session: MixSession, window: PreviewWindow) -> PreviewReport {
        let job_name = format!("{}_preview", session.video.stem());
        let scope = job_scope(&self.settings, &job_name);
        let logger = Arc::new(job_logger(&job_name, &scope, &self.settings, None, None));

        if let Err(e) = prepare_scope(&scope, &job_name) {
            logger.error(&e.to_string());
            return PreviewReport {
                job_name,
                window,
                outcome: JobOutcome::from_error(&e),
                played: false,
                log: logger.lines(),
            };
        }

        let ctx = Context::new(
            session,
            self.settings.clone(),
            scope,
            Arc::clone(&logger),
            Arc::clone(&self.tool),
        );
        let mut state = JobState::new(uuid::Uuid::new_v4().to_string());

        let result = self.pipeline(window).run(&ctx, &mut state);

        // The window file outlives the job's other temp files until playback ends.
        let window_guard = TempArtifacts::new();
        if let Some(preview) = &state.preview {
            ctx.artifacts.release(&preview.window_file);
            window_guard.register(&preview.window_file);
        }
        let removed = ctx.artifacts.cleanup();
        logger.debug(&format!("Removed {} temp file(s) after render", removed));

        let (outcome, played) = match (result, state.preview) {
            (Ok(_), Some(preview)) => {
                logger.info(&format!("Playing {}", preview.window_file.display()));
                let title = format!("Preview: {}", ctx.session.video.display_name);
                match self.player.play(&preview.window_file, &title) {
                    Ok(()) => (
                        JobOutcome::Succeeded {
                            output: preview.window_file,
                        },
                        true,
                    ),
                    Err(e) => {
                        logger.error(&format!("Playback failed: {}", e));
                        (
                            JobOutcome::Failed {
                                diagnostic: format!("Playback failed: {}", e),
                            },
                            true,
                        )
                    }
                }
            }
            (Ok(_), None) => (
                JobOutcome::Failed {
                    diagnostic: "Preview render produced no window".to_string(),
                },
                false,
            ),
            (Err(e), _) => (JobOutcome::from_error(&e), false),
        };
        window_guard.cleanup();

        PreviewReport {
            job_name,
            window,
            outcome,
            played,
            log: logger.lines(),
        }
    }
}
