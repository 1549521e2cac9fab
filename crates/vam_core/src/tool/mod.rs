//! External tool boundary.
//!
//! [`MediaTool`] is the transcoding collaborator: an argument list in, an
//! exit code with captured text out. [`Player`] is the preview viewer.
//! Both have process-backed implementations and are traits so tests can
//! substitute fakes.

mod errors;
mod player;
mod process;

pub use errors::{ToolError, ToolResult};
pub use player::{FfplayPlayer, Player};
pub use process::{quote_arg, MediaTool, ProcessTool, ToolOutput, FFMPEG_BASE_ARGS};
