//! Data models for Video Audio Mixer.
//!
//! This module contains the core data structures shared by the registry,
//! the planner and the executor:
//! - Enums for clip categories and music length policies
//! - Media structures (probed video assets, audio clips)
//! - Per-video mix configuration and the session projection

mod enums;
mod errors;
mod media;
mod session;

pub use enums::{AudioCategory, LengthMode, MusicLength};
pub use errors::{ModelError, ModelResult};
pub use media::{frames_from_seconds, AudioClip, ClipId, VideoAsset, VideoId};
pub use session::{MixConfiguration, MixSession, SessionSummary};
