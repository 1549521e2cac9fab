//! Mix plan construction.
//!
//! `build_plan` turns a video, its clips and a configuration into a
//! [`MixPlan`]. It never touches the filesystem: intermediate paths are only
//! named, from the job's [`ArtifactScope`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::fragment::{AudioChain, ChainSource, FilterOp, MixDuration, MixStage, MIX_OUTPUT_LABEL};
use super::random::{plan_rng, sample_music_offset};
use super::scope::ArtifactScope;
use crate::models::{AudioCategory, AudioClip, MixConfiguration, MixSession, VideoAsset};

/// Role of an invocation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRole {
    /// Picture source (original or extended video), always input 0.
    Video,
    /// A clip's audio.
    Clip,
    /// The original video re-added after extension, read for its audio only.
    OriginalAudio,
}

/// One input of the final invocation, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    pub path: PathBuf,
    pub role: InputRole,
}

/// Parameters of the black-frame extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionPlan {
    /// Length of the black segment in seconds.
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Video the black segment is appended to.
    pub source_video: PathBuf,
    pub black_clip: PathBuf,
    pub concat_list: PathBuf,
    pub extended_video: PathBuf,
}

impl ExtensionPlan {
    /// Intermediate files the extension stage may create.
    pub fn artifacts(&self) -> [&PathBuf; 3] {
        [&self.black_clip, &self.concat_list, &self.extended_video]
    }
}

/// Which audio the final invocation maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioMapping {
    /// The labelled mix output.
    Mixed(String),
    /// The first audio stream of one input, unfiltered.
    Direct(usize),
    /// Video only.
    Silent,
}

/// Declarative description of one mix job.
///
/// Built once, consumed by the executor or the preview runner, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixPlan {
    /// Inputs of the final invocation; index 0 is the picture source.
    pub inputs: Vec<PlanInput>,
    /// Per-input chains in clip order, original soundtrack last.
    pub chains: Vec<AudioChain>,
    /// Present iff there is at least one chain.
    pub mix: Option<MixStage>,
    /// Present iff audio runs past the end of the video.
    pub extension: Option<ExtensionPlan>,
}

impl MixPlan {
    pub fn needs_extension(&self) -> bool {
        self.extension.is_some()
    }

    /// Length of the black segment, 0 when no extension is needed.
    pub fn black_extension_duration(&self) -> f64 {
        self.extension
            .as_ref()
            .map(|e| e.duration_secs)
            .unwrap_or(0.0)
    }

    /// Path of input 0.
    pub fn video_input(&self) -> Option<&PathBuf> {
        self.inputs.first().map(|i| &i.path)
    }

    /// Number of inputs that contribute audio.
    pub fn audio_input_count(&self) -> usize {
        self.inputs
            .iter()
            .filter(|i| i.role != InputRole::Video)
            .count()
    }

    /// Stream mapping for the final invocation.
    pub fn audio_mapping(&self) -> AudioMapping {
        if let Some(mix) = &self.mix {
            return AudioMapping::Mixed(mix.output_label.clone());
        }
        if self.audio_input_count() == 1 {
            if let Some(index) = self.inputs.iter().position(|i| i.role != InputRole::Video) {
                return AudioMapping::Direct(index);
            }
        }
        AudioMapping::Silent
    }

    /// Chains reading the given category.
    pub fn chains_for(&self, category: AudioCategory) -> impl Iterator<Item = &AudioChain> {
        self.chains.iter().filter(move |c| {
            matches!(&c.source, ChainSource::Clip { category: cat, .. } if *cat == category)
        })
    }

    /// The chain of the original soundtrack, if it takes part.
    pub fn original_chain(&self) -> Option<&AudioChain> {
        self.chains
            .iter()
            .find(|c| c.source == ChainSource::Original)
    }
}

/// Build the plan for a session.
pub fn build_session_plan(session: &MixSession, scope: &ArtifactScope) -> MixPlan {
    build_plan(&session.video, &session.clips, &session.config, scope)
}

/// Build a mix plan.
///
/// Deterministic when `config.music_seed` is set.
pub fn build_plan(
    video: &VideoAsset,
    clips: &[AudioClip],
    config: &MixConfiguration,
    scope: &ArtifactScope,
) -> MixPlan {
    let include_original = !config.override_original && video.has_audio;
    let lead = config.effective_lead();
    let mut rng = plan_rng(config.music_seed);

    let mut chains = Vec::with_capacity(clips.len() + 1);
    for (i, clip) in clips.iter().enumerate() {
        let mut ops = Vec::new();

        let mut offset = clip.source_offset_secs;
        if clip.category == AudioCategory::Music {
            offset += config.music_start_offset;
            if config.music_random {
                offset += sample_music_offset(
                    &mut rng,
                    clip.duration_secs,
                    video.duration_secs,
                    config.music_retry_limit,
                );
            }
        }
        if offset > 0.0 {
            ops.push(FilterOp::SourceTrim {
                offset_secs: offset,
            });
        }

        if clip.category == AudioCategory::Music {
            if let Some(seconds) = config.music_length.limit_seconds(video.fps) {
                ops.push(FilterOp::LengthLimit { seconds });
            }
        }

        let delay = clip.start_seconds(video.fps) + lead;
        if delay > 0.0 {
            ops.push(FilterOp::delay_from_secs(delay));
        }

        chains.push(AudioChain {
            input_index: i + 1,
            source: ChainSource::Clip {
                id: clip.id.clone(),
                category: clip.category,
            },
            ops,
            label: format!("{}{}", clip.category.tag(), i),
        });
    }

    let extension_secs = extension_duration(video, clips);
    let extension = (extension_secs > 0.0).then(|| ExtensionPlan {
        duration_secs: extension_secs,
        width: video.width,
        height: video.height,
        fps: video.fps,
        source_video: video.path.clone(),
        black_clip: scope.black_clip(),
        concat_list: scope.concat_list(),
        extended_video: scope.extended_video(),
    });

    let mut inputs = Vec::with_capacity(clips.len() + 2);
    inputs.push(PlanInput {
        path: extension
            .as_ref()
            .map(|e| e.extended_video.clone())
            .unwrap_or_else(|| video.path.clone()),
        role: InputRole::Video,
    });
    inputs.extend(clips.iter().map(|clip| PlanInput {
        path: clip.path.clone(),
        role: InputRole::Clip,
    }));

    if include_original {
        // The concat output's audio ends before the black segment, so the
        // original soundtrack is read from the untouched source instead.
        let input_index = if extension.is_some() {
            inputs.push(PlanInput {
                path: video.path.clone(),
                role: InputRole::OriginalAudio,
            });
            inputs.len() - 1
        } else {
            0
        };

        let mut ops = Vec::new();
        if lead > 0.0 {
            ops.push(FilterOp::delay_from_secs(lead));
        }
        chains.push(AudioChain {
            input_index,
            source: ChainSource::Original,
            ops,
            label: "orig".to_string(),
        });
    }

    let mix = (!chains.is_empty()).then(|| MixStage {
        inputs: chains.iter().map(|c| c.label.clone()).collect(),
        duration: MixDuration::Longest,
        normalize: config.loudness_safe_mix,
        output_label: MIX_OUTPUT_LABEL.to_string(),
    });

    MixPlan {
        inputs,
        chains,
        mix,
        extension,
    }
}

/// Seconds of black needed so every effect and voice clip ends inside the video.
///
/// Music never contributes.
pub fn extension_duration(video: &VideoAsset, clips: &[AudioClip]) -> f64 {
    clips
        .iter()
        .filter(|c| c.category.drives_extension())
        .map(|c| c.end_seconds(video.fps) - video.duration_secs)
        .fold(0.0_f64, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MusicLength;
    use crate::plan::render::render_filter_graph;

    const TOL: f64 = 1e-3;

    fn scope() -> ArtifactScope {
        ArtifactScope::with_token("/work", "demo", "tok")
    }

    fn video(duration: f64, has_audio: bool) -> VideoAsset {
        VideoAsset::new("/media/demo.mp4", duration, 25.0, (1920, 1080), has_audio)
    }

    fn clip(category: AudioCategory, duration: f64) -> AudioClip {
        AudioClip::new(format!("/media/{}.wav", category.tag()), category, duration, 48000)
    }

    fn seeded() -> MixConfiguration {
        MixConfiguration {
            music_seed: Some(1234),
            ..Default::default()
        }
    }

    #[test]
    fn empty_silent_plan() {
        let config = MixConfiguration {
            override_original: true,
            ..seeded()
        };
        let plan = build_plan(&video(5.0, true), &[], &config, &scope());

        assert!(plan.chains.is_empty());
        assert!(plan.mix.is_none());
        assert!(!plan.needs_extension());
        assert_eq!(plan.audio_mapping(), AudioMapping::Silent);
        assert_eq!(plan.inputs.len(), 1);
    }

    #[test]
    fn video_without_audio_and_no_clips_is_silent() {
        let plan = build_plan(&video(5.0, false), &[], &seeded(), &scope());
        assert!(plan.chains.is_empty());
        assert_eq!(plan.black_extension_duration(), 0.0);
    }

    #[test]
    fn scenario_effect_past_end_extends_and_mixes_original() {
        let clips = vec![clip(AudioCategory::Effect, 6.0).with_start_frame(0)];
        let plan = build_plan(&video(5.0, true), &clips, &seeded(), &scope());

        assert!(plan.needs_extension());
        assert!((plan.black_extension_duration() - 1.0).abs() < TOL);
        assert_eq!(plan.chains.len(), 2);
        assert_eq!(plan.mix.as_ref().map(|m| m.inputs.len()), Some(2));

        // extended video first, clip, then the original again for its audio
        assert_eq!(plan.inputs.len(), 3);
        assert_eq!(plan.inputs[0].path, scope().extended_video());
        assert_eq!(plan.inputs[2].role, InputRole::OriginalAudio);
        assert_eq!(plan.original_chain().map(|c| c.input_index), Some(2));
    }

    #[test]
    fn original_chain_reads_input_zero_without_extension() {
        let clips = vec![clip(AudioCategory::Voice, 2.0)];
        let plan = build_plan(&video(5.0, true), &clips, &seeded(), &scope());
        assert!(!plan.needs_extension());
        assert_eq!(plan.original_chain().map(|c| c.input_index), Some(0));
        assert_eq!(plan.inputs.len(), 2);
    }

    #[test]
    fn scenario_music_fixed_seconds_trims_then_limits() {
        let config = MixConfiguration {
            music_start_offset: 1.0,
            music_length: MusicLength::FixedSeconds(8.0),
            music_random: false,
            ..seeded()
        };
        let clips = vec![clip(AudioCategory::Music, 20.0)];
        let plan = build_plan(&video(5.0, true), &clips, &config, &scope());

        assert!(!plan.needs_extension());
        let music = plan.chains_for(AudioCategory::Music).next().unwrap();
        assert_eq!(
            music.ops,
            vec![
                FilterOp::SourceTrim { offset_secs: 1.0 },
                FilterOp::LengthLimit { seconds: 8.0 },
            ]
        );
    }

    #[test]
    fn music_never_extends() {
        let clips = vec![clip(AudioCategory::Music, 600.0).with_start_frame(100)];
        let plan = build_plan(&video(5.0, true), &clips, &seeded(), &scope());
        assert!(!plan.needs_extension());
    }

    #[test]
    fn extension_matches_overhang_for_placed_clips() {
        for (start_frame, duration) in [(0u64, 5.5), (50, 4.0), (100, 0.1), (124, 3.3)] {
            for category in [AudioCategory::Effect, AudioCategory::Voice] {
                let v = video(5.0, false);
                let c = clip(category, duration).with_start_frame(start_frame);
                let s = start_frame as f64 / 25.0;
                let plan = build_plan(&v, &[c], &seeded(), &scope());
                if s + duration > 5.0 {
                    assert!(plan.needs_extension());
                    assert!((plan.black_extension_duration() - (s + duration - 5.0)).abs() < TOL);
                } else {
                    assert!(!plan.needs_extension());
                }
            }
        }
    }

    #[test]
    fn scenario_largest_overhang_wins() {
        let clips = vec![
            clip(AudioCategory::Effect, 6.2),
            clip(AudioCategory::Effect, 8.4),
        ];
        let plan = build_plan(&video(5.0, true), &clips, &seeded(), &scope());
        assert!((plan.black_extension_duration() - 3.4).abs() < TOL);
    }

    #[test]
    fn lead_delays_every_chain() {
        let config = MixConfiguration {
            audio_lead_secs: 0.25,
            ..seeded()
        };
        let clips = vec![clip(AudioCategory::Voice, 1.0).with_start_frame(25)];
        let plan = build_plan(&video(5.0, true), &clips, &config, &scope());

        assert_eq!(plan.chains[0].delay_millis(), 1250);
        assert_eq!(plan.original_chain().map(|c| c.delay_millis()), Some(250));
    }

    #[test]
    fn unplaced_clip_has_no_fragments() {
        let clips = vec![clip(AudioCategory::Effect, 1.0)];
        let plan = build_plan(&video(5.0, false), &clips, &seeded(), &scope());
        assert!(plan.chains[0].ops.is_empty());
    }

    #[test]
    fn fixed_frames_limit_uses_frame_rate() {
        let config = MixConfiguration {
            music_length: MusicLength::FixedFrames(50.0),
            music_random: false,
            ..seeded()
        };
        let clips = vec![clip(AudioCategory::Music, 20.0)];
        let plan = build_plan(&video(5.0, false), &clips, &config, &scope());
        assert_eq!(plan.chains[0].ops, vec![FilterOp::LengthLimit { seconds: 2.0 }]);
    }

    #[test]
    fn random_offset_only_for_music_longer_than_video() {
        let clips = vec![
            clip(AudioCategory::Music, 3.0),
            clip(AudioCategory::Music, 60.0),
        ];
        let plan = build_plan(&video(5.0, false), &clips, &seeded(), &scope());
        assert!(!plan.chains[0].has_source_trim());
        match plan.chains[1].ops.first() {
            Some(FilterOp::SourceTrim { offset_secs }) => {
                assert!(*offset_secs >= 0.0 && *offset_secs <= 55.0)
            }
            other => panic!("expected trim, got {other:?}"),
        }
    }

    #[test]
    fn same_seed_renders_identical_graph() {
        let clips = vec![
            clip(AudioCategory::Music, 90.0),
            clip(AudioCategory::Effect, 7.0).with_start_frame(12),
        ];
        let v = video(5.0, true);
        let first = render_filter_graph(&build_plan(&v, &clips, &seeded(), &scope()));
        let second = render_filter_graph(&build_plan(&v, &clips, &seeded(), &scope()));
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn normalize_follows_loudness_flag() {
        let clips = vec![clip(AudioCategory::Effect, 1.0)];
        let config = MixConfiguration {
            loudness_safe_mix: false,
            ..seeded()
        };
        let plan = build_plan(&video(5.0, true), &clips, &config, &scope());
        assert_eq!(plan.mix.map(|m| m.normalize), Some(false));
    }

    #[test]
    fn single_audio_input_without_chain_maps_directly() {
        let plan = MixPlan {
            inputs: vec![
                PlanInput {
                    path: "/v.mp4".into(),
                    role: InputRole::Video,
                },
                PlanInput {
                    path: "/a.wav".into(),
                    role: InputRole::Clip,
                },
            ],
            chains: Vec::new(),
            mix: None,
            extension: None,
        };
        assert_eq!(plan.audio_mapping(), AudioMapping::Direct(1));
    }
}
