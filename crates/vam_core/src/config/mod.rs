//! Configuration for the mixer.
//!
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only the changed section is rewritten)
//! - Clamping on load, with missing keys filled from defaults
//!
//! The planning and execution code never reads the file: it receives
//! [`Settings`] values, or the [`RegistryDefaults`](crate::registry::RegistryDefaults)
//! derived from them.
//!
//! # Example
//!
//! ```no_run
//! use vam_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! config.settings_mut().mix.loudness_safe_mix = false;
//! config.update_section(ConfigSection::Mix).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    BatchSettings, ConfigSection, EncodingSettings, LoggingSettings, MixSettings, MusicSettings,
    PathSettings, PreviewSettings, Settings, ToolSettings,
};
