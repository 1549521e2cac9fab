//! Probed media assets: videos and the audio clips attached to them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AudioCategory;

/// Identifier of an imported video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

/// Identifier of an imported audio clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            /// Borrow the identifier as a string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(VideoId);
string_id!(ClipId);

/// A probed video file.
///
/// Immutable once probed; a re-import replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAsset {
    /// Registry identifier.
    pub id: VideoId,
    /// Path to the video file.
    pub path: PathBuf,
    /// Name shown to the user (file name by default).
    pub display_name: String,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Frame rate of the first video stream.
    pub fps: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Whether the file carries its own audio stream.
    pub has_audio: bool,
}

impl VideoAsset {
    /// Create a new video asset with a fresh identifier.
    pub fn new(
        path: impl Into<PathBuf>,
        duration_secs: f64,
        fps: f64,
        resolution: (u32, u32),
        has_audio: bool,
    ) -> Self {
        let path = path.into();
        Self {
            id: VideoId::generate(),
            display_name: file_display_name(&path),
            path,
            duration_secs,
            fps,
            width: resolution.0,
            height: resolution.1,
            has_audio,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Frame size as `(width, height)`.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Duration expressed in whole frames.
    pub fn duration_frames(&self) -> u64 {
        if self.fps <= 0.0 {
            return 0;
        }
        (self.duration_secs * self.fps).floor() as u64
    }

    /// File stem used to name job artifacts.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// An audio clip attached to one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    /// Registry identifier.
    pub id: ClipId,
    /// Path to the audio file.
    pub path: PathBuf,
    /// Name shown to the user (file name by default).
    pub display_name: String,
    /// Category deciding trim and extension behaviour.
    pub category: AudioCategory,
    /// Source duration in seconds.
    pub duration_secs: f64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Timeline start as a frame count of the owning video (`None` = 0).
    #[serde(default)]
    pub start_frame: Option<u64>,
    /// Seconds into the source at which playback begins.
    #[serde(default)]
    pub source_offset_secs: f64,
}

impl AudioClip {
    /// Create a new clip with a fresh identifier, placed at frame 0.
    pub fn new(
        path: impl Into<PathBuf>,
        category: AudioCategory,
        duration_secs: f64,
        sample_rate: u32,
    ) -> Self {
        let path = path.into();
        Self {
            id: ClipId::generate(),
            display_name: file_display_name(&path),
            path,
            category,
            duration_secs,
            sample_rate,
            start_frame: None,
            source_offset_secs: 0.0,
        }
    }

    /// Set the timeline start frame.
    pub fn with_start_frame(mut self, frame: u64) -> Self {
        self.start_frame = Some(frame);
        self
    }

    /// Set the source trim offset in seconds.
    pub fn with_source_offset(mut self, secs: f64) -> Self {
        self.source_offset_secs = secs;
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: AudioCategory) -> Self {
        self.category = category;
        self
    }

    /// Timeline start in seconds for the given frame rate.
    pub fn start_seconds(&self, fps: f64) -> f64 {
        if fps <= 0.0 {
            return 0.0;
        }
        self.start_frame.unwrap_or(0) as f64 / fps
    }

    /// Timeline end in seconds (start plus source duration).
    pub fn end_seconds(&self, fps: f64) -> f64 {
        self.start_seconds(fps) + self.duration_secs
    }
}

/// Convert a timeline position in seconds to a frame count.
///
/// Returns `None` when the frame rate is unusable.
pub fn frames_from_seconds(seconds: f64, fps: f64) -> Option<u64> {
    if fps <= 0.0 || !fps.is_finite() {
        return None;
    }
    Some((seconds.max(0.0) * fps).round() as u64)
}

fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
