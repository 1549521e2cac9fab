//! Extend step - appends black frames so the video covers trailing audio.

use super::{ensure_parent_dir, require_plan, run_tool};
use crate::command::{black_clip_args, concat_args, concat_manifest, resolve_geometry};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, ExtendOutput, JobState, StepOutcome};

/// Synthesize black → write manifest → concat.
///
/// Each stage runs only if the previous one succeeded. All three
/// intermediate files are registered with the job's artifact guard before
/// the first invocation.
pub struct ExtendStep {
    /// Substitute default geometry when the video's is unknown.
    geometry_fallback: bool,
}

impl ExtendStep {
    pub fn new() -> Self {
        Self {
            geometry_fallback: false,
        }
    }

    /// Use 1920x1080 at 25 fps when the video's size or rate is unknown.
    pub fn with_geometry_fallback(mut self) -> Self {
        self.geometry_fallback = true;
        self
    }
}

impl Default for ExtendStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ExtendStep {
    fn name(&self) -> &str {
        "Extend"
    }

    fn description(&self) -> &str {
        "Append a black segment to cover audio past the end of the video"
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let plan = require_plan(state)?;
        let Some(ext) = plan.extension.as_ref() else {
            return Ok(StepOutcome::Skipped("audio ends within the video".to_string()));
        };

        let known = ext.width > 0 && ext.height > 0 && ext.fps.is_finite() && ext.fps > 0.0;
        if !known && !self.geometry_fallback {
            return Err(StepError::precondition_failed(format!(
                "Unknown frame size or rate for {}",
                ext.source_video.display()
            )));
        }
        let (resolution, fps) = resolve_geometry((ext.width, ext.height), ext.fps);
        if !known {
            ctx.logger.warn(&format!(
                "Using fallback geometry {}x{} @ {} fps",
                resolution.0, resolution.1, fps
            ));
        }

        for path in ext.artifacts() {
            ctx.artifacts.register(path);
        }
        ensure_parent_dir(&ext.extended_video)?;

        ctx.logger.section("Synthesizing black frames");
        ctx.report_progress(self.name(), 10, "Synthesizing black frames");
        run_tool(
            ctx,
            &black_clip_args(ext.duration_secs, resolution, fps, &ext.black_clip),
        )?;

        std::fs::write(
            &ext.concat_list,
            concat_manifest(&ext.source_video, &ext.black_clip),
        )
        .map_err(|e| StepError::io_error("writing concat manifest", e))?;

        ctx.logger.section("Concatenating");
        ctx.report_progress(self.name(), 60, "Concatenating");
        run_tool(ctx, &concat_args(&ext.concat_list, &ext.extended_video))?;

        let output = ExtendOutput {
            extended_video: ext.extended_video.clone(),
            black_secs: ext.duration_secs,
        };
        state.extend = Some(output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let ext = state
            .extend
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Extension results not recorded"))?;
        if !ext.extended_video.exists() {
            return Err(StepError::invalid_output(format!(
                "Extended video not created: {}",
                ext.extended_video.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioCategory;
    use crate::orchestrator::errors::ErrorClass;
    use crate::orchestrator::testing::{context_for, sample_clip, sample_session, FakeTool};
    use crate::plan::build_session_plan;
    use std::sync::Arc;

    fn extending_context(dir: &std::path::Path, tool: Arc<FakeTool>) -> Context {
        let clip = sample_clip(dir, "boom.wav", AudioCategory::Effect, 6.0);
        context_for(dir, sample_session(dir, vec![clip]), tool)
    }

    #[test]
    fn runs_black_then_concat() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::new());
        let ctx = extending_context(dir.path(), tool.clone());
        let mut state = JobState::new("job").with_plan(build_session_plan(&ctx.session, &ctx.scope));

        let step = ExtendStep::new();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();

        let calls = tool.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].iter().any(|a| a.starts_with("color=c=black:s=1920x1080:d=1.000")));
        assert!(calls[1].contains(&"concat".to_string()));

        let manifest = std::fs::read_to_string(ctx.scope.concat_list()).unwrap();
        assert_eq!(manifest.lines().count(), 2);
        assert_eq!(ctx.artifacts.tracked().len(), 3);
        assert_eq!(state.video_input(), Some(&ctx.scope.extended_video()));
    }

    #[test]
    fn skipped_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::new());
        let clip = sample_clip(dir.path(), "boom.wav", AudioCategory::Effect, 1.0);
        let ctx = context_for(dir.path(), sample_session(dir.path(), vec![clip]), tool.clone());
        let mut state = JobState::new("job").with_plan(build_session_plan(&ctx.session, &ctx.scope));

        let outcome = ExtendStep::new().execute(&ctx, &mut state).unwrap();
        assert!(matches!(outcome, StepOutcome::Skipped(_)));
        assert_eq!(tool.call_count(), 0);
    }

    #[test]
    fn failed_synthesis_stops_before_concat() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::failing_at(0, 1));
        let ctx = extending_context(dir.path(), tool.clone());
        let mut state = JobState::new("job").with_plan(build_session_plan(&ctx.session, &ctx.scope));

        let err = ExtendStep::new().execute(&ctx, &mut state).unwrap_err();
        assert_eq!(err.classify(), ErrorClass::Invocation);
        assert_eq!(tool.call_count(), 1);
        assert!(!ctx.scope.concat_list().exists());

        ctx.artifacts.cleanup();
        assert!(!ctx.scope.black_clip().exists());
    }

    #[test]
    fn unknown_geometry_needs_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let tool = Arc::new(FakeTool::new());
        let clip = sample_clip(dir.path(), "boom.wav", AudioCategory::Voice, 6.0);
        let mut session = sample_session(dir.path(), vec![clip]);
        session.video.width = 0;
        session.video.height = 0;
        let ctx = context_for(dir.path(), session, tool.clone());
        let plan = build_session_plan(&ctx.session, &ctx.scope);

        let mut state = JobState::new("job").with_plan(plan.clone());
        let err = ExtendStep::new().execute(&ctx, &mut state).unwrap_err();
        assert_eq!(err.classify(), ErrorClass::Precondition);
        assert_eq!(tool.call_count(), 0);

        let mut state = JobState::new("job").with_plan(plan);
        ExtendStep::new()
            .with_geometry_fallback()
            .execute(&ctx, &mut state)
            .unwrap();
        assert!(tool.calls()[0]
            .iter()
            .any(|a| a.starts_with("color=c=black:s=1920x1080")));
    }
}
