//! Core enums used throughout the mixer.

use serde::{Deserialize, Serialize};

use super::errors::{ModelError, ModelResult};

/// Category of an audio clip attached to a video.
///
/// Effects and voice-over are hard requirements on the output length;
/// music is background material whose length is policy-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCategory {
    /// Short sound effect (SE).
    Effect,
    /// Voice-over (VO).
    Voice,
    /// Background music.
    Music,
}

impl AudioCategory {
    /// Whether clips of this category can force the video to be extended.
    pub fn drives_extension(&self) -> bool {
        matches!(self, Self::Effect | Self::Voice)
    }

    /// Short tag used in labels and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Effect => "se",
            Self::Voice => "vo",
            Self::Music => "music",
        }
    }
}

impl std::fmt::Display for AudioCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioCategory::Effect => write!(f, "Effect"),
            AudioCategory::Voice => write!(f, "Voice"),
            AudioCategory::Music => write!(f, "Music"),
        }
    }
}

/// Music length policy selector, without its value.
///
/// Used by UI combo boxes and by the persisted form of [`MusicLength`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthMode {
    /// Let the mixdown duration bound the music.
    #[default]
    MatchVideo,
    /// Cut the music after a fixed number of seconds.
    FixedSeconds,
    /// Cut the music after a fixed number of video frames.
    FixedFrames,
}

impl LengthMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MatchVideo => "Match video",
            Self::FixedSeconds => "Fixed seconds",
            Self::FixedFrames => "Fixed frames",
        }
    }

    /// Get all available modes.
    pub fn all() -> &'static [LengthMode] {
        &[Self::MatchVideo, Self::FixedSeconds, Self::FixedFrames]
    }

    /// Create from index (for UI combo boxes).
    pub fn from_index(index: usize) -> Self {
        Self::all().get(index).copied().unwrap_or_default()
    }

    /// Get index of this mode (for UI combo boxes).
    pub fn to_index(&self) -> usize {
        Self::all().iter().position(|m| m == self).unwrap_or(0)
    }
}

impl std::fmt::Display for LengthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Music length policy with its value.
///
/// Fixed policies always carry their value, so a fixed policy without a
/// value cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum MusicLength {
    #[default]
    MatchVideo,
    FixedSeconds(f64),
    FixedFrames(f64),
}

impl MusicLength {
    /// Build a policy from a mode and an optional value.
    ///
    /// `MatchVideo` ignores the value; fixed modes require one.
    pub fn from_parts(mode: LengthMode, value: Option<f64>) -> ModelResult<Self> {
        match (mode, value) {
            (LengthMode::MatchVideo, _) => Ok(Self::MatchVideo),
            (LengthMode::FixedSeconds, Some(v)) => Ok(Self::FixedSeconds(v)),
            (LengthMode::FixedFrames, Some(v)) => Ok(Self::FixedFrames(v)),
            (mode, None) => Err(ModelError::MissingPolicyValue(mode.name())),
        }
    }

    /// The mode without its value.
    pub fn mode(&self) -> LengthMode {
        match self {
            Self::MatchVideo => LengthMode::MatchVideo,
            Self::FixedSeconds(_) => LengthMode::FixedSeconds,
            Self::FixedFrames(_) => LengthMode::FixedFrames,
        }
    }

    /// The policy value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::MatchVideo => None,
            Self::FixedSeconds(v) | Self::FixedFrames(v) => Some(*v),
        }
    }

    /// Length limit in seconds for a video with the given frame rate.
    ///
    /// Frame counts are converted with the frame rate floored at 1.0.
    pub fn limit_seconds(&self, fps: f64) -> Option<f64> {
        match self {
            Self::MatchVideo => None,
            Self::FixedSeconds(secs) => Some(*secs),
            Self::FixedFrames(frames) => Some(*frames / fps.max(1.0)),
        }
    }

    /// Check the policy value is usable.
    pub fn validate(&self) -> ModelResult<()> {
        match self.value() {
            Some(v) if !v.is_finite() || v <= 0.0 => Err(ModelError::invalid("music_length", v)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_effects_and_voice_drive_extension() {
        assert!(AudioCategory::Effect.drives_extension());
        assert!(AudioCategory::Voice.drives_extension());
        assert!(!AudioCategory::Music.drives_extension());
    }

    #[test]
    fn fixed_modes_require_value() {
        assert_eq!(
            MusicLength::from_parts(LengthMode::FixedSeconds, None),
            Err(ModelError::MissingPolicyValue("Fixed seconds"))
        );
        assert_eq!(
            MusicLength::from_parts(LengthMode::MatchVideo, Some(4.0)),
            Ok(MusicLength::MatchVideo)
        );
        assert_eq!(
            MusicLength::from_parts(LengthMode::FixedFrames, Some(50.0)),
            Ok(MusicLength::FixedFrames(50.0))
        );
    }

    #[test]
    fn frame_limit_floors_frame_rate() {
        assert_eq!(MusicLength::FixedFrames(50.0).limit_seconds(25.0), Some(2.0));
        assert_eq!(MusicLength::FixedFrames(50.0).limit_seconds(0.0), Some(50.0));
        assert_eq!(MusicLength::FixedSeconds(8.0).limit_seconds(25.0), Some(8.0));
        assert_eq!(MusicLength::MatchVideo.limit_seconds(25.0), None);
    }

    #[test]
    fn music_length_serializes_with_mode_tag() {
        let json = serde_json::to_string(&MusicLength::FixedSeconds(8.0)).unwrap();
        assert_eq!(json, r#"{"mode":"fixed_seconds","value":8.0}"#);
        let parsed: MusicLength = serde_json::from_str(r#"{"mode":"match_video"}"#).unwrap();
        assert_eq!(parsed, MusicLength::MatchVideo);
    }

    #[test]
    fn length_mode_index_round_trip() {
        for mode in LengthMode::all() {
            assert_eq!(LengthMode::from_index(mode.to_index()), *mode);
        }
        assert_eq!(LengthMode::from_index(99), LengthMode::MatchVideo);
    }
}
