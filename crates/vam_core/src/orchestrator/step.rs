//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - check preconditions before any tool runs
/// 2. `execute` - perform the step's work
/// 3. `validate_output` - verify the step produced what it claims
///
/// # Example
///
/// ```ignore
/// struct ProbeCheckStep;
///
/// impl PipelineStep for ProbeCheckStep {
///     fn name(&self) -> &str { "ProbeCheck" }
///
///     fn validate_input(&self, ctx: &Context) -> StepResult<()> {
///         if !ctx.session.video.path.exists() {
///             return Err(StepError::file_not_found(ctx.session.video.path.display().to_string()));
///         }
///         Ok(())
///     }
///
///     fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
///         Ok(StepOutcome::Success)
///     }
///
///     fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    ///
    /// Errors returned here happen before any external tool is invoked.
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Execute the step's main work and record results in `state`.
    ///
    /// Returns `StepOutcome::Skipped` if there is nothing to do.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    /// Validate outputs after execution.
    ///
    /// Only called after `execute` returns `Success`.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Whether this step can be skipped.
    fn is_optional(&self) -> bool {
        false
    }

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
