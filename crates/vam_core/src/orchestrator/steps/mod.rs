//! Pipeline step implementations.
//!
//! A mix job is `Plan → Extend → Mixdown`; a preview replaces the last
//! step with `PreviewRender`.

mod extend;
mod mixdown;
mod plan;
mod preview;

pub use extend::ExtendStep;
pub use mixdown::MixdownStep;
pub use plan::PlanStep;
pub use preview::PreviewRenderStep;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::types::{Context, JobState};
use crate::plan::MixPlan;
use crate::tool::ToolOutput;

/// Run the job's tool, logging the command line and its output.
///
/// A non-zero exit shows the output tail and becomes `CommandFailed`.
fn run_tool(ctx: &Context, args: &[String]) -> StepResult<ToolOutput> {
    let tool = ctx.tool.as_ref();

    ctx.logger.command(&tool.command_line(args));
    if ctx.settings.logging.show_options_pretty {
        ctx.logger.log_options_pretty(tool.name(), args);
    }

    let output = tool.run(args)?;

    if !output.stdout.is_empty() {
        ctx.logger.output_text(&output.stdout, false);
    }
    if !output.stderr.is_empty() {
        ctx.logger.output_text(&output.stderr, true);
    }

    if !output.success() {
        ctx.logger.show_tail(&format!("{} output", tool.name()));
        return Err(StepError::command_failed(
            tool.name(),
            output.exit_code,
            output.stderr.trim(),
        ));
    }
    Ok(output)
}

fn require_plan(state: &JobState) -> StepResult<&MixPlan> {
    state
        .plan
        .as_ref()
        .ok_or_else(|| StepError::other("No mix plan; the Plan step must run first"))
}

/// Make sure the directory that will hold `path` exists.
fn ensure_parent_dir(path: &std::path::Path) -> StepResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StepError::io_error("creating output directory", e))?;
        }
    }
    Ok(())
}
