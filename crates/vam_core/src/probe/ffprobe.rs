//! ffprobe-backed prober.

use std::path::Path;

use serde::Deserialize;

use super::{AudioProbe, MediaProber, ProbeError, ProbeResult, VideoProbe};
use crate::tool::{MediaTool, ProcessTool, ToolError};

const PROBE_ARGS: [&str; 7] = [
    "-v",
    "error",
    "-show_streams",
    "-show_format",
    "-of",
    "json",
    "--",
];

#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    sample_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl ProbeDocument {
    fn stream(&self, kind: &str) -> Option<&ProbeStream> {
        self.streams.iter().find(|s| s.codec_type == kind)
    }

    fn duration(&self, stream: &ProbeStream) -> Option<f64> {
        self.format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .or(stream.duration.as_deref())
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
    }
}

/// Parse an ffprobe rate such as `30000/1001` or `25`. Zero denominators give `None`.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Parse ffprobe JSON for a video file.
pub fn parse_video_probe(json: &str, path: &Path) -> ProbeResult<VideoProbe> {
    let doc: ProbeDocument = serde_json::from_str(json)?;
    let video = doc
        .stream("video")
        .ok_or_else(|| ProbeError::NoVideoStream(path.to_path_buf()))?;

    let fps = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.avg_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    let duration_secs = doc.duration(video).ok_or(ProbeError::MissingField {
        path: path.to_path_buf(),
        field: "duration",
    })?;

    Ok(VideoProbe {
        duration_secs,
        fps,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        has_audio: doc.stream("audio").is_some(),
    })
}

/// Parse ffprobe JSON for an audio file.
pub fn parse_audio_probe(json: &str, path: &Path) -> ProbeResult<AudioProbe> {
    let doc: ProbeDocument = serde_json::from_str(json)?;
    let audio = doc
        .stream("audio")
        .ok_or_else(|| ProbeError::NoAudioStream(path.to_path_buf()))?;

    let duration_secs = doc.duration(audio).ok_or(ProbeError::MissingField {
        path: path.to_path_buf(),
        field: "duration",
    })?;

    Ok(AudioProbe {
        duration_secs,
        sample_rate: audio
            .sample_rate
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
    })
}

/// [`MediaProber`] that shells out to ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    tool: ProcessTool,
}

impl FfprobeProber {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            tool: ProcessTool::new(program),
        }
    }

    fn probe_json(&self, path: &Path) -> ProbeResult<String> {
        if !path.exists() {
            return Err(ProbeError::FileNotFound(path.to_path_buf()));
        }

        let mut args: Vec<String> = PROBE_ARGS.iter().map(|s| s.to_string()).collect();
        args.push(path.to_string_lossy().to_string());

        let output = self.tool.run(&args)?;
        if !output.success() {
            return Err(ToolError::failed(
                self.tool.name(),
                output.exit_code,
                output.stderr.trim().to_string(),
            )
            .into());
        }
        Ok(output.stdout)
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProber for FfprobeProber {
    fn probe_video(&self, path: &Path) -> ProbeResult<VideoProbe> {
        parse_video_probe(&self.probe_json(path)?, path)
    }

    fn probe_audio(&self, path: &Path) -> ProbeResult<AudioProbe> {
        parse_audio_probe(&self.probe_json(path)?, path)
    }
}
