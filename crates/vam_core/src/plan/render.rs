//! Rendering of typed fragments into ffmpeg filter-graph text.

use super::builder::MixPlan;
use super::fragment::{AudioChain, FilterOp, MixDuration, MixStage};

/// Render one fragment.
pub fn render_op(op: &FilterOp) -> String {
    match op {
        FilterOp::SourceTrim { offset_secs } => {
            format!("atrim=start={},asetpts=PTS-STARTPTS", fmt_secs(*offset_secs))
        }
        FilterOp::LengthLimit { seconds } => {
            format!("atrim=0:{},asetpts=PTS-STARTPTS", fmt_secs(*seconds))
        }
        FilterOp::Delay { millis } => format!("adelay={millis}|{millis}"),
    }
}

/// Render a chain as `[in:a]op,op[label]`.
pub fn render_chain(chain: &AudioChain) -> String {
    let body = if chain.ops.is_empty() {
        "anull".to_string()
    } else {
        chain.ops.iter().map(render_op).collect::<Vec<_>>().join(",")
    };
    format!("[{}:a]{}[{}]", chain.input_index, body, chain.label)
}

/// Render the mix stage.
pub fn render_mix(mix: &MixStage) -> String {
    let inputs: String = mix.inputs.iter().map(|l| format!("[{l}]")).collect();
    let duration = match mix.duration {
        MixDuration::Longest => "longest",
    };
    format!(
        "{}amix=inputs={}:duration={}:normalize={}[{}]",
        inputs,
        mix.inputs.len(),
        duration,
        u8::from(mix.normalize),
        mix.output_label
    )
}

/// Full `-filter_complex` argument, or `None` when the plan has no audio chains.
pub fn render_filter_graph(plan: &MixPlan) -> Option<String> {
    let mix = plan.mix.as_ref()?;
    let mut parts: Vec<String> = plan.chains.iter().map(render_chain).collect();
    parts.push(render_mix(mix));
    Some(parts.join(";"))
}

fn fmt_secs(secs: f64) -> String {
    format!("{secs:.3}")
}
