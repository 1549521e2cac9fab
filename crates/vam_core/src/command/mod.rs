//! Argument builders for every ffmpeg invocation of a job.
//!
//! Extension: [`black_clip_args`] → [`concat_manifest`] → [`concat_args`].
//! Final mux and preview: [`MixdownArgsBuilder`].

mod extension;
mod mixdown;

pub use extension::{
    black_clip_args, concat_args, concat_manifest, resolve_geometry, FALLBACK_FPS,
    FALLBACK_RESOLUTION,
};
pub use mixdown::{MixdownArgsBuilder, PreviewWindow};
