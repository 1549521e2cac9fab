//! Clip registry: imported videos, their clips and per-video configuration.

mod matching;
mod store;

pub use matching::{name_variants, names_match};
pub use store::{output_path_for, ClipRegistry, RegistryDefaults, RegistryError, RegistryResult};
