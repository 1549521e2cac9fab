//! Mixdown step - renders the final output with ffmpeg.

use super::{ensure_parent_dir, require_plan, run_tool};
use crate::command::MixdownArgsBuilder;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, MixdownOutput, StepOutcome};

/// Runs the final invocation: picture copied from input 0, audio from the
/// mix stage (or the single audio input, or none).
///
/// The target file is tracked as a temp artifact until the invocation
/// succeeds, so a failed run leaves no partial output.
pub struct MixdownStep;

impl MixdownStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MixdownStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MixdownStep {
    fn name(&self) -> &str {
        "Mixdown"
    }

    fn description(&self) -> &str {
        "Mix the audio chains and mux them with the video"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let target = &ctx.session.target_output;
        if *target == ctx.session.video.path {
            return Err(StepError::invalid_input(format!(
                "Output would overwrite the source video: {}",
                target.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let plan = require_plan(state)?;
        let output_path = ctx.session.target_output.clone();
        ctx.logger.info(&format!("Output: {}", output_path.display()));

        ensure_parent_dir(&output_path)?;
        let tokens = MixdownArgsBuilder::new(plan, &ctx.settings.encoding, &output_path).build();

        ctx.artifacts.register(&output_path);
        ctx.logger.section("Executing ffmpeg");
        ctx.report_progress(self.name(), 50, "Mixing");
        let output = run_tool(ctx, &tokens)?;
        ctx.artifacts.release(&output_path);

        state.mixdown = Some(MixdownOutput {
            command: ctx.tool.command_line(&tokens),
            exit_code: output.exit_code,
            output_path: output_path.clone(),
        });

        ctx.logger.success(&format!(
            "Mixed to: {}",
            output_path.file_name().unwrap_or_default().to_string_lossy()
        ));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let mixdown = state
            .mixdown
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Mixdown results not recorded"))?;

        if !mixdown.output_path.exists() {
            return Err(StepError::invalid_output(format!(
                "Output file not created: {}",
                mixdown.output_path.display()
            )));
        }
        Ok(())
    }
}
