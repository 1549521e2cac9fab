//! Typed filter fragments.
//!
//! The planner only ever produces these records; the textual filter-graph
//! syntax is produced from them in `render`.

use serde::{Deserialize, Serialize};

use crate::models::{AudioCategory, ClipId};

/// One audio filter operation with its numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterOp {
    /// Start playback `offset_secs` into the source and reset timestamps to zero.
    SourceTrim { offset_secs: f64 },
    /// Keep only the first `seconds` of the (already trimmed) stream.
    LengthLimit { seconds: f64 },
    /// Shift the stream forward on both channels.
    Delay { millis: u64 },
}

impl FilterOp {
    /// Build a delay fragment from seconds, rounded to whole milliseconds.
    pub fn delay_from_secs(secs: f64) -> Self {
        Self::Delay {
            millis: (secs.max(0.0) * 1000.0).round() as u64,
        }
    }
}

/// What an audio chain reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainSource {
    /// A registered clip.
    Clip { id: ClipId, category: AudioCategory },
    /// The video's own soundtrack.
    Original,
}

/// The fragments applied to one audio input before the mix stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChain {
    /// Index of the invocation input this chain reads.
    pub input_index: usize,
    pub source: ChainSource,
    /// Fragments in application order.
    pub ops: Vec<FilterOp>,
    /// Unique output reference.
    pub label: String,
}

impl AudioChain {
    /// Whether the chain carries a fragment of the given kind.
    pub fn has_source_trim(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, FilterOp::SourceTrim { .. }))
    }

    pub fn has_length_limit(&self) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, FilterOp::LengthLimit { .. }))
    }

    /// Total delay in milliseconds, 0 if the chain is not delayed.
    pub fn delay_millis(&self) -> u64 {
        self.ops
            .iter()
            .find_map(|op| match op {
                FilterOp::Delay { millis } => Some(*millis),
                _ => None,
            })
            .unwrap_or(0)
    }
}

/// How the mixed stream's length is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixDuration {
    /// Last input to end decides.
    #[default]
    Longest,
}

/// Final stage combining every chain output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixStage {
    /// Chain labels in mix order.
    pub inputs: Vec<String>,
    pub duration: MixDuration,
    /// Allow the mixer to attenuate to avoid clipping.
    pub normalize: bool,
    pub output_label: String,
}

/// Label of the mixed audio stream.
pub const MIX_OUTPUT_LABEL: &str = "aout";
