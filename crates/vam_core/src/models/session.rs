//! Per-video mix configuration and the session projection fed to the planner.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::MusicLength;
use super::errors::{ModelError, ModelResult};
use super::media::{AudioClip, VideoAsset};

/// Per-video mix settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixConfiguration {
    /// Drop the video's own soundtrack from the mix.
    #[serde(default)]
    pub override_original: bool,

    /// Let the mixer attenuate to avoid clipping (amix normalize=1).
    #[serde(default = "default_true")]
    pub loudness_safe_mix: bool,

    /// How long background music may play.
    #[serde(default)]
    pub music_length: MusicLength,

    /// Fixed seconds skipped at the start of every music clip.
    #[serde(default)]
    pub music_start_offset: f64,

    /// Add a random start offset to music longer than the video.
    #[serde(default = "default_true")]
    pub music_random: bool,

    /// Number of random draws; the last one is used.
    #[serde(default = "default_retry_limit")]
    pub music_retry_limit: u32,

    /// Seed for the random start offset (`None` = entropy).
    #[serde(default)]
    pub music_seed: Option<u64>,

    /// Lead in seconds added to every clip's placement. Negative values count as 0.
    #[serde(default)]
    pub audio_lead_secs: f64,
}

fn default_true() -> bool {
    true
}

fn default_retry_limit() -> u32 {
    3
}

impl Default for MixConfiguration {
    fn default() -> Self {
        Self {
            override_original: false,
            loudness_safe_mix: true,
            music_length: MusicLength::default(),
            music_start_offset: 0.0,
            music_random: true,
            music_retry_limit: default_retry_limit(),
            music_seed: None,
            audio_lead_secs: 0.0,
        }
    }
}

impl MixConfiguration {
    /// Effective lead applied to every placement.
    pub fn effective_lead(&self) -> f64 {
        self.audio_lead_secs.max(0.0)
    }

    /// Check that every numeric setting is usable.
    pub fn validate(&self) -> ModelResult<()> {
        self.music_length.validate()?;
        if !self.music_start_offset.is_finite() || self.music_start_offset < 0.0 {
            return Err(ModelError::invalid("music_start_offset", self.music_start_offset));
        }
        if !self.audio_lead_secs.is_finite() {
            return Err(ModelError::invalid("audio_lead_secs", self.audio_lead_secs));
        }
        Ok(())
    }
}

/// One video with its clips, settings and target: the planner's input.
///
/// A projection built from the registry on demand; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MixSession {
    pub video: VideoAsset,
    pub clips: Vec<AudioClip>,
    pub config: MixConfiguration,
    pub target_output: PathBuf,
}

impl MixSession {
    /// Create a session.
    pub fn new(
        video: VideoAsset,
        clips: Vec<AudioClip>,
        config: MixConfiguration,
        target_output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            video,
            clips,
            config,
            target_output: target_output.into(),
        }
    }

    /// Whether the video's own soundtrack takes part in the mix.
    pub fn includes_original_audio(&self) -> bool {
        !self.config.override_original && self.video.has_audio
    }

    /// Check the session can be planned.
    pub fn validate(&self) -> ModelResult<()> {
        self.config.validate()?;

        let video = &self.video;
        if !video.duration_secs.is_finite() || video.duration_secs < 0.0 {
            return Err(ModelError::invalid("video.duration_secs", video.duration_secs));
        }
        if !video.fps.is_finite() || video.fps < 0.0 {
            return Err(ModelError::invalid("video.fps", video.fps));
        }

        for clip in &self.clips {
            if !clip.duration_secs.is_finite() || clip.duration_secs < 0.0 {
                return Err(ModelError::invalid("clip.duration_secs", clip.duration_secs));
            }
            if !clip.source_offset_secs.is_finite() || clip.source_offset_secs < 0.0 {
                return Err(ModelError::invalid(
                    "clip.source_offset_secs",
                    clip.source_offset_secs,
                ));
            }
            if clip.start_frame.is_some_and(|f| f > 0) && video.fps <= 0.0 {
                return Err(ModelError::MissingFrameRate(video.display_name.clone()));
            }
        }
        Ok(())
    }

    /// Serializable overview for logs and UI lists.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            video: self.video.display_name.clone(),
            duration_secs: self.video.duration_secs,
            clips: self
                .clips
                .iter()
                .map(|c| format!("[{}] {}", c.category.tag(), c.display_name))
                .collect(),
            original_audio: self.includes_original_audio(),
            loudness_safe_mix: self.config.loudness_safe_mix,
            music_length: self.config.music_length,
            target_output: self.target_output.clone(),
        }
    }
}

/// Overview of a [`MixSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub video: String,
    pub duration_secs: f64,
    pub clips: Vec<String>,
    pub original_audio: bool,
    pub loudness_safe_mix: bool,
    pub music_length: MusicLength,
    pub target_output: PathBuf,
}
