//! Preview render step - encodes a short window of the mix.

use super::{ensure_parent_dir, require_plan, run_tool};
use crate::command::{MixdownArgsBuilder, PreviewWindow};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, PreviewOutput, StepOutcome};

/// Renders `[start, start + duration)` of the planned mix into the job's
/// preview window file, re-encoding the picture with a fast codec.
pub struct PreviewRenderStep {
    window: PreviewWindow,
}

impl PreviewRenderStep {
    pub fn new(window: PreviewWindow) -> Self {
        Self { window }
    }
}

impl PipelineStep for PreviewRenderStep {
    fn name(&self) -> &str {
        "PreviewRender"
    }

    fn description(&self) -> &str {
        "Render a short preview window"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let plan = require_plan(state)?;
        let window_file = ctx.scope.preview_window();
        ensure_parent_dir(&window_file)?;

        let tokens = MixdownArgsBuilder::new(plan, &ctx.settings.encoding, &window_file)
            .preview(self.window)
            .build();

        ctx.artifacts.register(&window_file);
        ctx.logger.section(&format!(
            "Rendering preview {:.3}s + {:.3}s",
            self.window.start_secs, self.window.duration_secs
        ));
        run_tool(ctx, &tokens)?;

        state.preview = Some(PreviewOutput {
            window_file,
            start_secs: self.window.start_secs,
            duration_secs: self.window.duration_secs,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let preview = state
            .preview
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Preview results not recorded"))?;
        if !preview.window_file.exists() {
            return Err(StepError::invalid_output(format!(
                "Preview file not created: {}",
                preview.window_file.display()
            )));
        }
        Ok(())
    }
}
