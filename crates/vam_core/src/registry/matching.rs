//! Filename pairing of audio clips with videos.
//!
//! A clip belongs to a video when their name variants intersect. Variants
//! are the lower-cased stem, the stem without an `a1_`..`a4_` prefix, and
//! either of those without a `-mix`, `_mix`, `-audio` or `_audio` suffix.

use std::collections::HashSet;
use std::path::Path;

const TRACK_PREFIXES: [&str; 4] = ["a1_", "a2_", "a3_", "a4_"];
const MIX_SUFFIXES: [&str; 4] = ["-mix", "_mix", "-audio", "_audio"];

/// All name variants for a file path.
pub fn name_variants(path: &Path) -> HashSet<String> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut bases = vec![stem.clone()];
    if let Some(rest) = TRACK_PREFIXES.iter().find_map(|p| stem.strip_prefix(p)) {
        bases.push(rest.to_string());
    }

    let mut variants = HashSet::new();
    for base in bases {
        if let Some(rest) = MIX_SUFFIXES.iter().find_map(|s| base.strip_suffix(s)) {
            if !rest.is_empty() {
                variants.insert(rest.to_string());
            }
        }
        if !base.is_empty() {
            variants.insert(base);
        }
    }
    variants
}

/// Whether an audio file and a video file share a name variant.
pub fn names_match(audio: &Path, video: &Path) -> bool {
    let audio = name_variants(audio);
    !name_variants(video).is_disjoint(&audio)
}
