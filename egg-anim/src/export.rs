//! Capture, encode and write one animation

use crate::capture::AnimationCapture;
use crate::egg::{encode_egg_animation, EggOptions};
use crate::error::ExportError;
use crate::provider::{PoseProvider, TopologyProvider};
use crate::sink::TextSink;

/// What to export and how to label it
#[derive(Clone, Debug)]
pub struct ExportRequest {
    /// Source animation name, written into the header comment
    pub animation_name: String,
    pub frame_from: i32,
    pub frame_to: i32,
    pub options: EggOptions,
}

/// Result of a successful export
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSummary {
    pub bone_count: usize,
    pub frame_count: usize,
    /// Channels stored with one value per frame
    pub varying_channels: usize,
    /// Channels collapsed to a single value
    pub constant_channels: usize,
    /// Bones exported without channels
    pub unresolved_bones: usize,
    pub bytes_written: usize,
}

/// Sample `pose` over the requested range, encode it along `rig` and hand the
/// text to `sink`
///
/// Nothing reaches the sink when the range or frame rate is invalid.
pub fn export_animation<P, T, S>(
    request: &ExportRequest,
    pose: &mut P,
    rig: &T,
    sink: &mut S,
) -> Result<ExportSummary, ExportError>
where
    P: PoseProvider + ?Sized,
    T: TopologyProvider + ?Sized,
    S: TextSink + ?Sized,
{
    let mut capture = AnimationCapture::new(
        request.animation_name.as_str(),
        request.frame_from,
        request.frame_to,
        pose.frame_rate(),
    )?;
    capture.sample(pose, rig)?;
    for mismatch in capture.frame_count_mismatches() {
        tracing::warn!(
            "Bone '{}' channel {}: {} samples for {} frames",
            mismatch.bone,
            mismatch.channel,
            mismatch.actual,
            mismatch.expected
        );
    }

    let text = encode_egg_animation(&capture, rig, &request.options);
    sink.write_text(&text)?;

    let (varying_channels, constant_channels) = capture
        .bones()
        .flat_map(|(_, bone)| bone.envelopes())
        .fold((0, 0), |(varying, constant), (_, envelope)| {
            if envelope.is_constant() {
                (varying, constant + 1)
            } else {
                (varying + 1, constant)
            }
        });

    let summary = ExportSummary {
        bone_count: capture.bone_count(),
        frame_count: capture.frame_count(),
        varying_channels,
        constant_channels,
        unresolved_bones: capture.unresolved_bones().len(),
        bytes_written: text.len(),
    };

    tracing::info!(
        "Exported '{}': {} bones, {} frames at {} fps ({} varying / {} constant channels)",
        capture.name,
        summary.bone_count,
        summary.frame_count,
        capture.fps,
        summary.varying_channels,
        summary.constant_channels
    );

    Ok(summary)
}
