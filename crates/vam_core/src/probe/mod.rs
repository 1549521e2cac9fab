//! Media probing.
//!
//! [`MediaProber`] is the boundary to the probing collaborator.
//! [`FfprobeProber`] implements it on top of `ffprobe -of json`.

mod ffprobe;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{AudioCategory, AudioClip, VideoAsset};
use crate::tool::ToolError;

pub use ffprobe::{parse_audio_probe, parse_frame_rate, parse_video_probe, FfprobeProber};

/// Errors from probing a media file.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Failed to parse probe output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No video stream found in {0}")]
    NoVideoStream(PathBuf),

    #[error("No audio stream found in {0}")]
    NoAudioStream(PathBuf),

    #[error("Probe output for {path} has no usable {field}")]
    MissingField { path: PathBuf, field: &'static str },
}

/// Result type for probing.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Probed properties of a video file.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProbe {
    pub duration_secs: f64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
}

/// Probed properties of an audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioProbe {
    pub duration_secs: f64,
    pub sample_rate: u32,
}

/// Probing collaborator.
pub trait MediaProber: Send + Sync {
    fn probe_video(&self, path: &Path) -> ProbeResult<VideoProbe>;
    fn probe_audio(&self, path: &Path) -> ProbeResult<AudioProbe>;
}

/// Probe a video and build its asset.
pub fn probe_video_asset(prober: &dyn MediaProber, path: &Path) -> ProbeResult<VideoAsset> {
    let probe = prober.probe_video(path)?;
    Ok(VideoAsset::new(
        path,
        probe.duration_secs,
        probe.fps,
        (probe.width, probe.height),
        probe.has_audio,
    ))
}

/// Probe an audio file and build a clip of the given category.
pub fn probe_audio_clip(
    prober: &dyn MediaProber,
    path: &Path,
    category: AudioCategory,
) -> ProbeResult<AudioClip> {
    let probe = prober.probe_audio(path)?;
    Ok(AudioClip::new(
        path,
        category,
        probe.duration_secs,
        probe.sample_rate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProber;

    impl MediaProber for FixedProber {
        fn probe_video(&self, _path: &Path) -> ProbeResult<VideoProbe> {
            Ok(VideoProbe {
                duration_secs: 12.5,
                fps: 29.97,
                width: 1280,
                height: 720,
                has_audio: true,
            })
        }

        fn probe_audio(&self, path: &Path) -> ProbeResult<AudioProbe> {
            Err(ProbeError::NoAudioStream(path.to_path_buf()))
        }
    }

    #[test]
    fn builds_assets_from_probe() {
        let asset = probe_video_asset(&FixedProber, Path::new("/v/intro.mov")).unwrap();
        assert_eq!(asset.display_name, "intro.mov");
        assert_eq!(asset.resolution(), (1280, 720));
        assert!(asset.has_audio);
    }

    #[test]
    fn probe_failure_yields_no_clip() {
        let err = probe_audio_clip(&FixedProber, Path::new("/a/x.wav"), AudioCategory::Voice)
            .unwrap_err();
        assert!(err.to_string().contains("No audio stream"));
    }
}
