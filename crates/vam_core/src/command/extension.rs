//! Arguments for the black-frame extension stages.

use std::path::Path;

/// Frame size and rate used when a video's own values are unknown.
pub const FALLBACK_RESOLUTION: (u32, u32) = (1920, 1080);
pub const FALLBACK_FPS: f64 = 25.0;

/// Synthesize a black clip of `duration_secs` at the given size and rate.
pub fn black_clip_args(
    duration_secs: f64,
    resolution: (u32, u32),
    fps: f64,
    output: &Path,
) -> Vec<String> {
    let (width, height) = resolution;
    vec![
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!("color=c=black:s={}x{}:d={:.3}", width, height, duration_secs),
        "-r".to_string(),
        format!("{:.3}", fps),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        path_arg(output),
    ]
}

/// Manifest listing `first` then `second` for the concat demuxer.
///
/// Paths use forward slashes; single quotes are escaped as `'\''`.
pub fn concat_manifest(first: &Path, second: &Path) -> String {
    format!(
        "file '{}'\nfile '{}'\n",
        escape_manifest_path(first),
        escape_manifest_path(second)
    )
}

/// Concatenate the segments named in `manifest` without re-encoding.
pub fn concat_args(manifest: &Path, output: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        path_arg(manifest),
        "-c".to_string(),
        "copy".to_string(),
        path_arg(output),
    ]
}

/// Resolve a size and rate, substituting fallbacks for unknown values.
pub fn resolve_geometry(resolution: (u32, u32), fps: f64) -> ((u32, u32), f64) {
    let resolution = if resolution.0 == 0 || resolution.1 == 0 {
        FALLBACK_RESOLUTION
    } else {
        resolution
    };
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        FALLBACK_FPS
    };
    (resolution, fps)
}

fn escape_manifest_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', "'\\''")
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
