//! Mix planning.
//!
//! A [`MixPlan`] is a typed, declarative description of one mix job: the
//! invocation inputs, one [`AudioChain`] of [`FilterOp`] fragments per audio
//! input, the final [`MixStage`], and the optional black-frame
//! [`ExtensionPlan`]. Text for the external tool is produced only by
//! [`render_filter_graph`].
//!
//! ```text
//! VideoAsset + [AudioClip] + MixConfiguration
//!         │ build_plan (pure)
//!         ▼
//!      MixPlan ──► render_filter_graph ──► "-filter_complex ..."
//! ```

mod builder;
mod fragment;
mod random;
mod render;
mod scope;

pub use builder::{
    build_plan, build_session_plan, extension_duration, AudioMapping, ExtensionPlan, InputRole,
    MixPlan, PlanInput,
};
pub use fragment::{AudioChain, ChainSource, FilterOp, MixDuration, MixStage, MIX_OUTPUT_LABEL};
pub use random::{plan_rng, sample_music_offset};
pub use render::{render_chain, render_filter_graph, render_mix, render_op};
pub use scope::ArtifactScope;
