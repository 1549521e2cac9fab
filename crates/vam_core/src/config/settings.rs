//! Settings struct with TOML-based sections.
//!
//! Each section maps to a TOML table and can be written back on its own.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::{LengthMode, MixConfiguration, MusicLength};
use crate::registry::RegistryDefaults;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub batch: BatchSettings,

    #[serde(default)]
    pub mix: MixSettings,

    #[serde(default)]
    pub music: MusicSettings,

    #[serde(default)]
    pub preview: PreviewSettings,

    #[serde(default)]
    pub tools: ToolSettings,

    #[serde(default)]
    pub encoding: EncodingSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Output, temp and log locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder; relative paths resolve against each video's folder.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for intermediate files.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for per-job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "output".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Batch scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Concurrent jobs; 0 uses the host core count.
    #[serde(default)]
    pub max_workers: usize,

    /// Skip videos that have no clips attached.
    #[serde(default = "default_true")]
    pub skip_without_clips: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_workers: 0,
            skip_without_clips: true,
        }
    }
}

impl BatchSettings {
    /// Worker count with auto-detection applied, at least 1.
    pub fn resolved_workers(&self) -> usize {
        match self.max_workers {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }
}

/// Mix defaults for new videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSettings {
    /// amix normalize on.
    #[serde(default = "default_true")]
    pub loudness_safe_mix: bool,

    #[serde(default)]
    pub override_original: bool,

    /// Lead in seconds applied to every clip.
    #[serde(default)]
    pub audio_lead_secs: f64,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            loudness_safe_mix: true,
            override_original: false,
            audio_lead_secs: 0.0,
        }
    }
}

/// Background music defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSettings {
    #[serde(default = "default_true")]
    pub random_enabled: bool,

    /// Fixed seed for reproducible offsets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Seconds skipped at the start of every music clip.
    #[serde(default)]
    pub start_offset: f64,

    #[serde(default)]
    pub length_mode: LengthMode,

    /// Seconds or frames for the fixed length modes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_value: Option<f64>,
}

fn default_retry_limit() -> u32 {
    3
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            random_enabled: true,
            seed: None,
            retry_limit: default_retry_limit(),
            start_offset: 0.0,
            length_mode: LengthMode::default(),
            length_value: None,
        }
    }
}

/// Preview window defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSettings {
    #[serde(default)]
    pub start_secs: f64,

    #[serde(default = "default_preview_duration")]
    pub duration_secs: f64,
}

fn default_preview_duration() -> f64 {
    10.0
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            start_secs: 0.0,
            duration_secs: default_preview_duration(),
        }
    }
}

/// External program locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    #[serde(default = "default_ffplay")]
    pub ffplay: String,

    /// Per-invocation bound in seconds; 0 waits indefinitely.
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_ffplay() -> String {
    "ffplay".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            ffplay: default_ffplay(),
            timeout_secs: 0,
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Codec directives for the final mux and the preview render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSettings {
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    #[serde(default = "default_preview_video_codec")]
    pub preview_video_codec: String,

    #[serde(default = "default_preview_preset")]
    pub preview_preset: String,

    #[serde(default = "default_preview_crf")]
    pub preview_crf: u32,

    #[serde(default = "default_preview_audio_bitrate")]
    pub preview_audio_bitrate: String,
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_preview_video_codec() -> String {
    "libx264".to_string()
}

fn default_preview_preset() -> String {
    "veryfast".to_string()
}

fn default_preview_crf() -> u32 {
    30
}

fn default_preview_audio_bitrate() -> String {
    "128k".to_string()
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            preview_video_codec: default_preview_video_codec(),
            preview_preset: default_preview_preset(),
            preview_crf: default_preview_crf(),
            preview_audio_bitrate: default_preview_audio_bitrate(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,

    /// Keep external tool output in the tail buffer only.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Lines of tool output shown after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Dump each command one option per line.
    #[serde(default)]
    pub show_options_pretty: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
            show_options_pretty: false,
        }
    }
}

impl Settings {
    /// Copy with out-of-range values clamped. `max_workers = 0` stays automatic.
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();
        s.music.retry_limit = s.music.retry_limit.max(1);
        s.music.start_offset = finite_or(s.music.start_offset, 0.0).max(0.0);
        s.mix.audio_lead_secs = finite_or(s.mix.audio_lead_secs, 0.0);
        s.preview.start_secs = finite_or(s.preview.start_secs, 0.0).max(0.0);
        s.preview.duration_secs = finite_or(s.preview.duration_secs, 1.0).max(1.0);
        s.logging.error_tail = s.logging.error_tail.max(1);
        s
    }

    /// Music length policy; an unusable fixed value falls back to matching the video.
    pub fn music_length(&self) -> MusicLength {
        match MusicLength::from_parts(self.music.length_mode, self.music.length_value) {
            Ok(policy) if policy.validate().is_ok() => policy,
            Ok(_) | Err(_) => {
                tracing::warn!(
                    "Ignoring music length '{}' without a usable value",
                    self.music.length_mode
                );
                MusicLength::MatchVideo
            }
        }
    }

    /// Configuration given to newly imported videos.
    pub fn mix_configuration(&self) -> MixConfiguration {
        MixConfiguration {
            override_original: self.mix.override_original,
            loudness_safe_mix: self.mix.loudness_safe_mix,
            music_length: self.music_length(),
            music_start_offset: self.music.start_offset.max(0.0),
            music_random: self.music.random_enabled,
            music_retry_limit: self.music.retry_limit.max(1),
            music_seed: self.music.seed,
            audio_lead_secs: self.mix.audio_lead_secs,
        }
    }

    /// Registry defaults derived from these settings.
    pub fn registry_defaults(&self) -> RegistryDefaults {
        RegistryDefaults {
            config: self.mix_configuration(),
            output_dir: PathBuf::from(&self.paths.output_folder),
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Batch,
    Mix,
    Music,
    Preview,
    Tools,
    Encoding,
    Logging,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Batch => "batch",
            ConfigSection::Mix => "mix",
            ConfigSection::Music => "music",
            ConfigSection::Preview => "preview",
            ConfigSection::Tools => "tools",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and working directories",
            ConfigSection::Batch => "Batch scheduling (max_workers = 0 uses every core)",
            ConfigSection::Mix => "Mix defaults for newly imported videos",
            ConfigSection::Music => "Background music placement",
            ConfigSection::Preview => "Preview window",
            ConfigSection::Tools => "External programs (timeout_secs = 0 disables the bound)",
            ConfigSection::Encoding => "Codec settings",
            ConfigSection::Logging => "Logging configuration",
        }
    }

    /// All sections in file order.
    pub fn all() -> &'static [ConfigSection] {
        &[
            ConfigSection::Paths,
            ConfigSection::Batch,
            ConfigSection::Mix,
            ConfigSection::Music,
            ConfigSection::Preview,
            ConfigSection::Tools,
            ConfigSection::Encoding,
            ConfigSection::Logging,
        ]
    }
}
