//! VAM Core - mix planning and ffmpeg job execution for Video Audio Mixer
//!
//! This crate contains all business logic with zero UI dependencies.
//! It can be used by a GUI application or a CLI tool.
//!
//! ```text
//! registry ──► MixSession ──► plan::build_plan ──► MixPlan
//!                                                    │
//!            orchestrator::MixExecutor / PreviewRunner ◄┘
//!                     │ command builders
//!                     ▼
//!               tool::MediaTool (ffmpeg)
//! ```

pub mod command;
pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod plan;
pub mod probe;
pub mod registry;
pub mod tool;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
