//! Sequential runner for the steps of one job.

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Ordered steps of one job, such as `Plan → Extend → Mixdown`.
///
/// A step sees the state left by the steps before it. The first error ends
/// the job; nothing after it runs.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step against `state`.
    ///
    /// Output checks only run for steps that did work; a skipped step leaves
    /// the state as it was.
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut run = PipelineRunResult::default();

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            if step.is_optional() {
                ctx.logger.phase(&format!("{} (optional)", name));
            } else {
                ctx.logger.phase(name);
            }
            ctx.report_progress(name, self.percent_before(index), step.description());

            let fail = |stage: &str, e: StepError| {
                ctx.logger.error(&format!("{} {}: {}", name, stage, e));
                PipelineError::step_failed(&ctx.job_name, name, e)
            };

            step.validate_input(ctx).map_err(|e| fail("rejected its inputs", e))?;
            match step.execute(ctx, state).map_err(|e| fail("failed", e))? {
                StepOutcome::Success => {
                    step.validate_output(ctx, state)
                        .map_err(|e| fail("produced bad output", e))?;
                    ctx.logger.success(&format!("{} done", name));
                    run.steps_completed.push(name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} not needed: {}", name, reason));
                    run.steps_skipped.push(name.to_string());
                }
            }
        }

        ctx.report_progress("Complete", 100, "All steps finished");
        Ok(run)
    }

    fn percent_before(&self, index: usize) -> u32 {
        (index * 100 / self.steps.len().max(1)) as u32
    }
}

/// Which steps did work and which had nothing to do.
#[derive(Debug, Clone, Default)]
pub struct PipelineRunResult {
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}
