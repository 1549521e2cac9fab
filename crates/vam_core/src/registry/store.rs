//! The clip registry service.
//!
//! All state lives behind one `parking_lot::Mutex`; each public operation
//! takes the lock once, so readers never see a half-applied change. Callers
//! only ever receive clones.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

use super::matching::names_match;
use crate::models::{
    frames_from_seconds, AudioCategory, AudioClip, ClipId, MixConfiguration, MixSession,
    ModelError, VideoAsset, VideoId,
};

/// Errors from registry operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Video not found: {0}")]
    VideoNotFound(VideoId),

    #[error("Clip {clip} not found on video {video}")]
    ClipNotFound { video: VideoId, clip: ClipId },

    #[error(transparent)]
    Invalid(#[from] ModelError),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Values applied to newly imported videos.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryDefaults {
    /// Configuration copied onto each new video.
    pub config: MixConfiguration,
    /// Output folder; relative paths resolve against each video's folder.
    pub output_dir: PathBuf,
}

impl Default for RegistryDefaults {
    fn default() -> Self {
        Self {
            config: MixConfiguration::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone)]
struct VideoEntry {
    asset: VideoAsset,
    clips: Vec<AudioClip>,
    config: MixConfiguration,
}

#[derive(Debug, Default)]
struct RegistryState {
    videos: Vec<VideoEntry>,
    defaults: RegistryDefaults,
    last_unmatched_warning: Option<String>,
}

impl RegistryState {
    fn entry(&self, id: &VideoId) -> RegistryResult<&VideoEntry> {
        self.videos
            .iter()
            .find(|e| &e.asset.id == id)
            .ok_or_else(|| RegistryError::VideoNotFound(id.clone()))
    }

    fn entry_mut(&mut self, id: &VideoId) -> RegistryResult<&mut VideoEntry> {
        self.videos
            .iter_mut()
            .find(|e| &e.asset.id == id)
            .ok_or_else(|| RegistryError::VideoNotFound(id.clone()))
    }

    fn session(&self, entry: &VideoEntry) -> MixSession {
        MixSession::new(
            entry.asset.clone(),
            entry.clips.clone(),
            entry.config.clone(),
            output_path_for(&entry.asset.path, &self.defaults.output_dir),
        )
    }
}

/// Registry of imported videos and the clips attached to them.
#[derive(Debug, Default)]
pub struct ClipRegistry {
    state: Mutex<RegistryState>,
}

impl ClipRegistry {
    /// Create an empty registry.
    pub fn new(defaults: RegistryDefaults) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                defaults,
                ..Default::default()
            }),
        }
    }

    /// Import a probed video.
    ///
    /// Re-importing a path already present replaces its descriptor and keeps
    /// its clips and configuration.
    pub fn import_video(&self, asset: VideoAsset) -> VideoId {
        let mut state = self.state.lock();
        if let Some(entry) = state.videos.iter_mut().find(|e| e.asset.path == asset.path) {
            let id = entry.asset.id.clone();
            entry.asset = VideoAsset { id: id.clone(), ..asset };
            tracing::debug!("Re-imported video {}", entry.asset.display_name);
            return id;
        }

        let id = asset.id.clone();
        let config = state.defaults.config.clone();
        tracing::debug!("Imported video {}", asset.display_name);
        state.videos.push(VideoEntry {
            asset,
            clips: Vec::new(),
            config,
        });
        id
    }

    /// Remove a video with its clips and configuration.
    pub fn remove_video(&self, id: &VideoId) -> RegistryResult<VideoAsset> {
        let mut state = self.state.lock();
        let index = state
            .videos
            .iter()
            .position(|e| &e.asset.id == id)
            .ok_or_else(|| RegistryError::VideoNotFound(id.clone()))?;
        Ok(state.videos.remove(index).asset)
    }

    /// Attach a clip to a video.
    pub fn add_clip(&self, video: &VideoId, clip: AudioClip) -> RegistryResult<ClipId> {
        let mut state = self.state.lock();
        let entry = state.entry_mut(video)?;
        let id = clip.id.clone();
        entry.clips.push(clip);
        Ok(id)
    }

    /// Attach clips to videos by filename.
    ///
    /// Each clip goes to the first imported video whose name it matches.
    /// Unmatched clips are returned, and a warning naming them is kept for
    /// [`last_unmatched_warning`](Self::last_unmatched_warning).
    pub fn import_clips(&self, clips: Vec<AudioClip>) -> Vec<AudioClip> {
        let mut state = self.state.lock();
        let mut unmatched = Vec::new();

        for clip in clips {
            match state
                .videos
                .iter_mut()
                .find(|e| names_match(&clip.path, &e.asset.path))
            {
                Some(entry) => {
                    tracing::debug!(
                        "Paired {} with {}",
                        clip.display_name,
                        entry.asset.display_name
                    );
                    entry.clips.push(clip);
                }
                None => unmatched.push(clip),
            }
        }

        state.last_unmatched_warning = if unmatched.is_empty() {
            None
        } else {
            let names: Vec<&str> = unmatched.iter().map(|c| c.display_name.as_str()).collect();
            let warning = format!("No matching video for: {}", names.join(", "));
            tracing::warn!("{}", warning);
            Some(warning)
        };

        unmatched
    }

    /// Detach a clip from a video.
    pub fn remove_clip(&self, video: &VideoId, clip: &ClipId) -> RegistryResult<AudioClip> {
        let mut state = self.state.lock();
        let entry = state.entry_mut(video)?;
        let index = entry
            .clips
            .iter()
            .position(|c| &c.id == clip)
            .ok_or_else(|| RegistryError::ClipNotFound {
                video: video.clone(),
                clip: clip.clone(),
            })?;
        Ok(entry.clips.remove(index))
    }

    /// Move a clip on the timeline and change its source trim.
    ///
    /// `start_seconds` is converted to a frame count with the owning video's
    /// frame rate; with no usable frame rate the start becomes unset. The
    /// source offset is clamped at zero.
    pub fn update_clip_placement(
        &self,
        video: &VideoId,
        clip: &ClipId,
        start_seconds: f64,
        source_offset_secs: f64,
    ) -> RegistryResult<()> {
        if !start_seconds.is_finite() || start_seconds < 0.0 {
            return Err(ModelError::invalid("start_seconds", start_seconds).into());
        }
        if !source_offset_secs.is_finite() {
            return Err(ModelError::invalid("source_offset_secs", source_offset_secs).into());
        }

        let mut state = self.state.lock();
        let entry = state.entry_mut(video)?;
        let fps = entry.asset.fps;
        let target = entry
            .clips
            .iter_mut()
            .find(|c| &c.id == clip)
            .ok_or_else(|| RegistryError::ClipNotFound {
                video: video.clone(),
                clip: clip.clone(),
            })?;

        target.start_frame = frames_from_seconds(start_seconds, fps);
        target.source_offset_secs = source_offset_secs.max(0.0);
        Ok(())
    }

    /// Change a clip's category.
    pub fn set_clip_category(
        &self,
        video: &VideoId,
        clip: &ClipId,
        category: AudioCategory,
    ) -> RegistryResult<()> {
        let mut state = self.state.lock();
        let entry = state.entry_mut(video)?;
        let target = entry
            .clips
            .iter_mut()
            .find(|c| &c.id == clip)
            .ok_or_else(|| RegistryError::ClipNotFound {
                video: video.clone(),
                clip: clip.clone(),
            })?;
        target.category = category;
        Ok(())
    }

    /// Replace a video's configuration after validating it.
    pub fn set_config(&self, video: &VideoId, config: MixConfiguration) -> RegistryResult<()> {
        config.validate()?;
        let mut state = self.state.lock();
        state.entry_mut(video)?.config = config;
        Ok(())
    }

    /// A video's configuration.
    pub fn config(&self, video: &VideoId) -> RegistryResult<MixConfiguration> {
        Ok(self.state.lock().entry(video)?.config.clone())
    }

    /// Set the loudness-safe default and apply it to every video.
    pub fn set_loudness_safe_default(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.defaults.config.loudness_safe_mix = enabled;
        for entry in &mut state.videos {
            entry.config.loudness_safe_mix = enabled;
        }
    }

    /// Set the override-original default and apply it to every video.
    pub fn set_override_original_default(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.defaults.config.override_original = enabled;
        for entry in &mut state.videos {
            entry.config.override_original = enabled;
        }
    }

    /// Change the output folder used for target paths.
    pub fn set_output_dir(&self, dir: impl Into<PathBuf>) {
        self.state.lock().defaults.output_dir = dir.into();
    }

    /// Current defaults.
    pub fn defaults(&self) -> RegistryDefaults {
        self.state.lock().defaults.clone()
    }

    /// Imported videos in import order.
    pub fn videos(&self) -> Vec<VideoAsset> {
        self.state
            .lock()
            .videos
            .iter()
            .map(|e| e.asset.clone())
            .collect()
    }

    /// Clips attached to a video, in registry order.
    pub fn clips(&self, video: &VideoId) -> RegistryResult<Vec<AudioClip>> {
        Ok(self.state.lock().entry(video)?.clips.clone())
    }

    /// Session projection for one video.
    pub fn session(&self, video: &VideoId) -> RegistryResult<MixSession> {
        let state = self.state.lock();
        let entry = state.entry(video)?;
        Ok(state.session(entry))
    }

    /// Session projections for every video, in import order.
    pub fn sessions(&self) -> Vec<MixSession> {
        let state = self.state.lock();
        state.videos.iter().map(|e| state.session(e)).collect()
    }

    /// Warning from the last [`import_clips`](Self::import_clips) call, if any clip was unmatched.
    pub fn last_unmatched_warning(&self) -> Option<String> {
        self.state.lock().last_unmatched_warning.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where the mix of `video` is written.
///
/// Named after the video file inside `output_dir` (relative dirs resolve
/// against the video's folder). A `_mix` suffix is added when that would
/// overwrite the source.
pub fn output_path_for(video: &Path, output_dir: &Path) -> PathBuf {
    let video_dir = video.parent().unwrap_or_else(|| Path::new(""));
    let dir = if output_dir.is_absolute() {
        output_dir.to_path_buf()
    } else {
        video_dir.join(output_dir)
    };

    let file_name = video.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    let target = dir.join(&file_name);
    if target != video {
        return target;
    }

    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match video.extension() {
        Some(ext) => format!("{}_mix.{}", stem, ext.to_string_lossy()),
        None => format!("{}_mix", stem),
    };
    dir.join(name)
}
