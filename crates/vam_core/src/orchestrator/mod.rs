//! Job orchestration: step pipeline, executor, preview and batch scheduler.
//!
//! A mix job is a short sequence of steps sharing one [`Context`] and one
//! [`JobState`]:
//!
//! ```text
//! MixExecutor                      PreviewRunner
//!     ├── Step: Plan                   ├── Step: Plan
//!     ├── Step: Extend (optional)      ├── Step: Extend (fallback geometry)
//!     └── Step: Mixdown                └── Step: PreviewRender → Player
//! ```
//!
//! Every intermediate file is registered with the job's [`TempArtifacts`]
//! guard and removed when the job ends, whatever the outcome.
//! [`JobScheduler`] runs many executor jobs on a bounded pool and keeps
//! succeeded / skipped / failed totals.
//!
//! # Example
//!
//! ```ignore
//! use vam_core::orchestrator::{JobScheduler, MixExecutor};
//!
//! let executor = MixExecutor::from_settings(settings).with_log_dir(".logs");
//! let batch = JobScheduler::new(executor).run(registry.sessions());
//! println!("{}", batch.totals);
//! ```

mod artifacts;
mod errors;
mod executor;
mod outcome;
mod pipeline;
mod preview;
mod scheduler;
mod step;
pub mod steps;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use artifacts::TempArtifacts;
pub use errors::{ErrorClass, PipelineError, PipelineResult, StepError, StepResult};
pub use executor::{JobLogSink, MixExecutor, StepProgressSink};
pub use outcome::{BatchTotals, JobOutcome, JobReport};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use preview::{PreviewReport, PreviewRunner};
pub use scheduler::{BatchJob, BatchProgressCallback, BatchReport, JobScheduler};
pub use step::PipelineStep;
pub use steps::{ExtendStep, MixdownStep, PlanStep, PreviewRenderStep};
pub use types::{
    Context, ExtendOutput, JobState, MixdownOutput, PreviewOutput, ProgressCallback, StepOutcome,
};
