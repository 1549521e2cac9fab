//! Arguments for the final mux and the preview render.
//!
//! Both read the same plan: picture from input 0, one chain per audio
//! input, and the mapped mix output. The final mux copies the picture; the
//! preview re-encodes a short window of it.

use std::path::Path;

use super::extension::path_arg;
use crate::config::EncodingSettings;
use crate::plan::{render_filter_graph, AudioMapping, InputRole, MixPlan};

/// A `[start, start + duration)` window of the output timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewWindow {
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl PreviewWindow {
    /// Window with start clamped to ≥ 0 and duration to ≥ 1 s.
    pub fn new(start_secs: f64, duration_secs: f64) -> Self {
        let start_secs = if start_secs.is_finite() {
            start_secs.max(0.0)
        } else {
            0.0
        };
        let duration_secs = if duration_secs.is_finite() {
            duration_secs.max(1.0)
        } else {
            1.0
        };
        Self {
            start_secs,
            duration_secs,
        }
    }
}

/// Builder for the final ffmpeg invocation of a plan.
pub struct MixdownArgsBuilder<'a> {
    plan: &'a MixPlan,
    encoding: &'a EncodingSettings,
    output_path: &'a Path,
    window: Option<PreviewWindow>,
}

impl<'a> MixdownArgsBuilder<'a> {
    pub fn new(plan: &'a MixPlan, encoding: &'a EncodingSettings, output_path: &'a Path) -> Self {
        Self {
            plan,
            encoding,
            output_path,
            window: None,
        }
    }

    /// Render only `window`, re-encoding the picture.
    pub fn preview(mut self, window: PreviewWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Build the argument list (without the tool's base arguments).
    pub fn build(&self) -> Vec<String> {
        let mut tokens = Vec::new();

        self.add_inputs(&mut tokens);

        if let Some(graph) = render_filter_graph(self.plan) {
            tokens.push("-filter_complex".to_string());
            tokens.push(graph);
        }

        let mapping = self.plan.audio_mapping();
        self.add_mapping(&mut tokens, &mapping);
        self.add_codecs(&mut tokens, &mapping);

        if let Some(window) = self.window {
            tokens.push("-t".to_string());
            tokens.push(format!("{:.3}", window.duration_secs));
        }

        tokens.push(path_arg(self.output_path));
        tokens
    }

    fn add_inputs(&self, tokens: &mut Vec<String>) {
        for input in &self.plan.inputs {
            // Picture and original soundtrack share the output timeline, so
            // both are seeked to the window.
            if let Some(window) = self.window {
                if matches!(input.role, InputRole::Video | InputRole::OriginalAudio) {
                    tokens.push("-ss".to_string());
                    tokens.push(format!("{:.3}", window.start_secs));
                    tokens.push("-t".to_string());
                    tokens.push(format!("{:.3}", window.duration_secs));
                }
            }
            tokens.push("-i".to_string());
            tokens.push(path_arg(&input.path));
        }
    }

    fn add_mapping(&self, tokens: &mut Vec<String>, mapping: &AudioMapping) {
        tokens.push("-map".to_string());
        tokens.push("0:v:0".to_string());
        match mapping {
            AudioMapping::Mixed(label) => {
                tokens.push("-map".to_string());
                tokens.push(format!("[{}]", label));
            }
            AudioMapping::Direct(index) => {
                tokens.push("-map".to_string());
                tokens.push(format!("{}:a:0", index));
            }
            AudioMapping::Silent => {}
        }
    }

    fn add_codecs(&self, tokens: &mut Vec<String>, mapping: &AudioMapping) {
        let enc = self.encoding;
        match self.window {
            Some(_) => {
                tokens.extend([
                    "-c:v".to_string(),
                    enc.preview_video_codec.clone(),
                    "-preset".to_string(),
                    enc.preview_preset.clone(),
                    "-crf".to_string(),
                    enc.preview_crf.to_string(),
                ]);
            }
            None => tokens.extend(["-c:v".to_string(), "copy".to_string()]),
        }

        if *mapping == AudioMapping::Silent {
            tokens.push("-an".to_string());
            return;
        }

        let bitrate = match self.window {
            Some(_) => &enc.preview_audio_bitrate,
            None => &enc.audio_bitrate,
        };
        tokens.extend([
            "-c:a".to_string(),
            enc.audio_codec.clone(),
            "-b:a".to_string(),
            bitrate.clone(),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AudioCategory, AudioClip, MixConfiguration, VideoAsset};
    use crate::plan::{build_plan, ArtifactScope};

    fn scope() -> ArtifactScope {
        ArtifactScope::with_token("/w", "demo", "t")
    }

    fn video(has_audio: bool) -> VideoAsset {
        VideoAsset::new("/v/demo.mp4", 5.0, 25.0, (1280, 720), has_audio)
    }

    fn joined(plan: &MixPlan, window: Option<PreviewWindow>) -> String {
        let enc = EncodingSettings::default();
        let mut builder = MixdownArgsBuilder::new(plan, &enc, Path::new("/o/demo.mp4"));
        if let Some(w) = window {
            builder = builder.preview(w);
        }
        builder.build().join(" ")
    }

    #[test]
    fn silent_plan_maps_video_only() {
        let config = MixConfiguration {
            override_original: true,
            ..Default::default()
        };
        let plan = build_plan(&video(true), &[], &config, &scope());
        assert_eq!(
            joined(&plan, None),
            "-i /v/demo.mp4 -map 0:v:0 -c:v copy -an /o/demo.mp4"
        );
    }

    #[test]
    fn mixed_plan_maps_mix_output() {
        let clips = vec![AudioClip::new("/a/hit.wav", AudioCategory::Effect, 1.0, 48000)];
        let plan = build_plan(&video(false), &clips, &MixConfiguration::default(), &scope());
        assert_eq!(
            joined(&plan, None),
            "-i /v/demo.mp4 -i /a/hit.wav \
             -filter_complex [1:a]anull[se0];[se0]amix=inputs=1:duration=longest:normalize=1[aout] \
             -map 0:v:0 -map [aout] -c:v copy -c:a aac -b:a 192k /o/demo.mp4"
        );
    }

    #[test]
    fn extended_plan_reads_original_audio_last() {
        let clips = vec![AudioClip::new("/a/vo.wav", AudioCategory::Voice, 7.0, 48000)];
        let plan = build_plan(&video(true), &clips, &MixConfiguration::default(), &scope());
        let args = MixdownArgsBuilder::new(&plan, &EncodingSettings::default(), Path::new("o.mp4"))
            .build();
        let inputs: Vec<&str> = args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(
            inputs,
            vec!["/w/demo_extended_t.mp4", "/a/vo.wav", "/v/demo.mp4"]
        );
        assert!(args.iter().any(|a| a.contains("[2:a]anull[orig]")));
    }

    #[test]
    fn preview_seeks_and_reencodes() {
        let clips = vec![AudioClip::new("/a/hit.wav", AudioCategory::Effect, 1.0, 48000)];
        let plan = build_plan(&video(false), &clips, &MixConfiguration::default(), &scope());
        let line = joined(&plan, Some(PreviewWindow::new(2.0, 4.0)));

        assert!(line.starts_with("-ss 2.000 -t 4.000 -i /v/demo.mp4 -i /a/hit.wav"));
        assert!(line.contains("-c:v libx264 -preset veryfast -crf 30"));
        assert!(line.ends_with("-c:a aac -b:a 128k -t 4.000 /o/demo.mp4"));
    }

    #[test]
    fn preview_window_clamps() {
        assert_eq!(
            PreviewWindow::new(-3.0, 0.2),
            PreviewWindow {
                start_secs: 0.0,
                duration_secs: 1.0
            }
        );
    }
}
