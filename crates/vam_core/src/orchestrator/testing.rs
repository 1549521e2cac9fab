//! Fakes shared by the orchestrator tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::types::Context;
use crate::config::Settings;
use crate::logging::{JobLogger, LogConfig};
use crate::models::{AudioCategory, AudioClip, MixConfiguration, MixSession, VideoAsset};
use crate::plan::ArtifactScope;
use crate::tool::{MediaTool, Player, ToolError, ToolOutput, ToolResult};

/// Stand-in for ffmpeg.
///
/// Successful calls write a small file at the last argument (the output
/// path). A scripted failure also leaves a partial output behind.
#[derive(Default)]
pub struct FakeTool {
    calls: Mutex<Vec<Vec<String>>>,
    fail_at: Option<(usize, i32)>,
    missing: bool,
    panic_at: Option<usize>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call number `index` (0-based) exits with `exit_code`.
    pub fn failing_at(index: usize, exit_code: i32) -> Self {
        Self {
            fail_at: Some((index, exit_code)),
            ..Self::default()
        }
    }

    /// Every call reports the program as missing.
    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }

    /// Call number `index` panics.
    pub fn panicking_at(index: usize) -> Self {
        Self {
            panic_at: Some(index),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

fn touch(path: &str, contents: &str) {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = fs::write(path, contents);
}

impl MediaTool for FakeTool {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn run(&self, args: &[String]) -> ToolResult<ToolOutput> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(args.to_vec());
            calls.len() - 1
        };

        if self.missing {
            return Err(ToolError::NotFound {
                program: "ffmpeg".to_string(),
            });
        }
        if self.panic_at == Some(index) {
            panic!("fake tool panicked on call {}", index);
        }

        let output = args.last().cloned().unwrap_or_default();
        if let Some((at, exit_code)) = self.fail_at {
            if at == index {
                touch(&output, "partial");
                return Ok(ToolOutput {
                    exit_code,
                    stdout: String::new(),
                    stderr: "Invalid data found when processing input".to_string(),
                });
            }
        }

        touch(&output, "fake media");
        Ok(ToolOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Records what it was asked to play; the file must exist at that moment.
#[derive(Default)]
pub struct FakePlayer {
    pub played: Mutex<Vec<(PathBuf, bool)>>,
    pub fail: bool,
}

impl Player for FakePlayer {
    fn play(&self, path: &Path, _title: &str) -> ToolResult<()> {
        self.played.lock().push((path.to_path_buf(), path.exists()));
        if self.fail {
            return Err(ToolError::failed("ffplay", 1, "no display"));
        }
        Ok(())
    }
}

/// A 5 s, 25 fps, 1080p video with audio, written to `dir/intro.mp4`.
pub fn sample_video(dir: &Path) -> VideoAsset {
    let path = dir.join("intro.mp4");
    fs::write(&path, b"video").unwrap();
    VideoAsset::new(path, 5.0, 25.0, (1920, 1080), true)
}

/// A clip file of `duration` seconds written to `dir/name`.
pub fn sample_clip(dir: &Path, name: &str, category: AudioCategory, duration: f64) -> AudioClip {
    let path = dir.join(name);
    fs::write(&path, b"audio").unwrap();
    AudioClip::new(path, category, duration, 48_000)
}

pub fn sample_session(dir: &Path, clips: Vec<AudioClip>) -> MixSession {
    let video = sample_video(dir);
    let target = dir.join("output").join("intro.mp4");
    MixSession::new(video, clips, MixConfiguration::default(), target)
}

/// Settings rooted in `dir`.
pub fn sample_settings(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.paths.output_folder = dir.join("output").to_string_lossy().to_string();
    settings.paths.temp_root = dir.join(".temp").to_string_lossy().to_string();
    settings.paths.logs_folder = dir.join(".logs").to_string_lossy().to_string();
    settings
}

pub fn context_for(dir: &Path, session: MixSession, tool: Arc<dyn MediaTool>) -> Context {
    let scope = ArtifactScope::new(dir.join(".temp"), session.video.stem());
    let logger = Arc::new(JobLogger::in_memory("intro", LogConfig::default()));
    Context::new(session, sample_settings(dir), scope, logger, tool)
}

/// Context for a clip-less session.
pub fn sample_context(dir: &Path, tool: Arc<dyn MediaTool>) -> Context {
    let session = sample_session(dir, Vec::new());
    context_for(dir, session, tool)
}

/// Files left in `dir` whose name contains the scope token.
pub fn leftovers(dir: &Path, token: &str) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.to_string_lossy().contains(token))
                .collect()
        })
        .unwrap_or_default()
}

/// Shorthand for a `MixConfiguration` with randomness off.
pub fn fixed_config() -> MixConfiguration {
    MixConfiguration {
        music_random: false,
        ..MixConfiguration::default()
    }
}
