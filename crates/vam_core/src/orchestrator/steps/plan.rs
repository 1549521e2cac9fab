//! Plan step - turns the session into a mix plan.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::plan::build_session_plan;

/// Builds the [`MixPlan`](crate::plan::MixPlan) for the job's session.
///
/// Every check that can turn a job into a skip happens here, before any
/// external tool runs.
pub struct PlanStep {
    /// Whether a video with no clips is still mixed.
    allow_empty: bool,
}

impl PlanStep {
    pub fn new() -> Self {
        Self { allow_empty: false }
    }

    /// Plan videos that have no clips (the output carries only the original audio, or none).
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}

impl Default for PlanStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PlanStep {
    fn name(&self) -> &str {
        "Plan"
    }

    fn description(&self) -> &str {
        "Build the filter chains and extension parameters"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let session = &ctx.session;

        if !session.video.path.exists() {
            return Err(StepError::file_not_found(
                session.video.path.display().to_string(),
            ));
        }
        if let Some(missing) = session.clips.iter().find(|c| !c.path.exists()) {
            return Err(StepError::file_not_found(missing.path.display().to_string()));
        }

        session
            .validate()
            .map_err(|e| StepError::invalid_input(e.to_string()))?;

        if session.clips.is_empty() && !self.allow_empty {
            return Err(StepError::precondition_failed(format!(
                "No audio matched to {}",
                session.video.display_name
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if state.has_plan() {
            return Ok(StepOutcome::Skipped("plan supplied by caller".to_string()));
        }

        let plan = build_session_plan(&ctx.session, &ctx.scope);
        ctx.logger.info(&format!(
            "{} audio chain(s), original audio {}",
            plan.chains.len(),
            if plan.original_chain().is_some() {
                "included"
            } else {
                "excluded"
            }
        ));
        if plan.needs_extension() {
            ctx.logger.info(&format!(
                "Audio runs {:.3}s past the video; extension required",
                plan.black_extension_duration()
            ));
        }

        state.plan = Some(plan);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_plan() {
            return Err(StepError::invalid_output("Plan not recorded"));
        }
        Ok(())
    }
}
