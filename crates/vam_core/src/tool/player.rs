//! Playback of rendered previews.

use std::path::Path;
use std::process::{Command, Stdio};

use super::errors::{ToolError, ToolResult};

/// Opens a media file for viewing and blocks until the viewer closes.
pub trait Player: Send + Sync {
    fn play(&self, path: &Path, title: &str) -> ToolResult<()>;
}

/// ffplay-based [`Player`]; exits by itself when playback ends.
#[derive(Debug, Clone)]
pub struct FfplayPlayer {
    program: String,
}

impl FfplayPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfplayPlayer {
    fn default() -> Self {
        Self::new("ffplay")
    }
}

impl Player for FfplayPlayer {
    fn play(&self, path: &Path, title: &str) -> ToolResult<()> {
        tracing::debug!("Playing {} with {}", path.display(), self.program);
        let output = Command::new(&self.program)
            .args(["-autoexit", "-loglevel", "error", "-window_title", title])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ToolError::spawn(&self.program, e))?;

        if !output.status.success() {
            return Err(ToolError::failed(
                &self.program,
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}
