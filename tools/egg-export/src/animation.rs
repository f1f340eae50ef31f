//! Pose sampling from glTF animation clips
//!
//! [`GltfPose`] evaluates one clip at `frame / fps` seconds. Nodes without an
//! animated property keep their rest value from the node transform.
//!
//! glTF is Y-up while `.egg` tables are written Z-up. Top-level bones are
//! expressed in world space, so they get the basis change; child bones are
//! relative to their parent and need none.

use anyhow::{Context, Result};
use egg_anim::{
    export_animation, BoneId, EggOptions, ExportError, ExportRequest, ExportSummary,
    PoseProvider, TextSink,
};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::{util::ReadOutputs, Interpolation};
use hashbrown::HashMap;

use crate::scene::GltfScene;
use crate::skeleton::GltfRig;

/// Default sample rate for animations (frames per second)
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

/// glTF Y-up to Z-up: (x, y, z) -> (x, -z, y), a quarter turn about X
pub const Y_UP_TO_Z_UP: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Keyframes of one animated property
#[derive(Clone, Debug)]
struct Track<T> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: Interpolation,
}

impl<T: Copy> Track<T> {
    fn new(times: Vec<f32>, values: Vec<T>, interpolation: Interpolation) -> Self {
        // Cubic spline outputs are (in-tangent, value, out-tangent) triples
        let values = if interpolation == Interpolation::CubicSpline {
            values.chunks_exact(3).map(|triple| triple[1]).collect()
        } else {
            values
        };
        Self {
            times,
            values,
            interpolation,
        }
    }

    fn sample(&self, t: f32, mix: impl Fn(T, T, f32) -> T) -> Option<T> {
        let count = self.times.len().min(self.values.len());
        if count == 0 {
            return None;
        }
        if count == 1 || t <= self.times[0] {
            return Some(self.values[0]);
        }
        if t >= self.times[count - 1] {
            return Some(self.values[count - 1]);
        }

        // Find keyframes: times[i] <= t < times[i + 1]
        let i = self.times[..count].partition_point(|&key| key <= t) - 1;
        let (t0, t1) = (self.times[i], self.times[i + 1]);
        let (v0, v1) = (self.values[i], self.values[i + 1]);

        if self.interpolation == Interpolation::Step {
            return Some(v0);
        }

        // Cubic spline tangents are ignored; keys are blended linearly
        let factor = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
        Some(mix(v0, v1, factor.clamp(0.0, 1.0)))
    }
}

#[derive(Clone, Debug, Default)]
struct NodeTracks {
    translation: Option<Track<Vec3>>,
    rotation: Option<Track<Quat>>,
    scale: Option<Track<Vec3>>,
}

#[derive(Clone, Copy, Debug)]
struct RestPose {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

/// Pose source backed by one glTF animation
#[derive(Clone, Debug)]
pub struct GltfPose {
    fps: f32,
    time: f32,
    rest: Vec<RestPose>,
    tracks: HashMap<usize, NodeTracks>,
    chains: Vec<Vec<usize>>,
    /// Per bone: no parent joint, so the transform is in world space
    top_level: Vec<bool>,
}

impl GltfPose {
    /// Prepare sampling of the named animation for `rig`
    pub fn new(
        scene: &GltfScene,
        rig: &GltfRig,
        animation_name: &str,
        fps: f32,
    ) -> Result<Self, ExportError> {
        let animation = scene
            .find_animation(animation_name)
            .ok_or_else(|| ExportError::MissingSource(animation_name.to_string()))?;

        let rest = scene
            .document
            .nodes()
            .map(|node| {
                let (t, r, s) = node.transform().decomposed();
                RestPose {
                    translation: Vec3::from(t),
                    rotation: Quat::from_array(r),
                    scale: Vec3::from(s),
                }
            })
            .collect();

        let mut tracks: HashMap<usize, NodeTracks> = HashMap::new();
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&scene.buffers[buffer.index()]));
            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs())
            else {
                tracing::warn!(
                    "Skipping channel on node {} of '{}': no keyframe data",
                    channel.target().node().index(),
                    animation_name
                );
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let interpolation = channel.sampler().interpolation();
            let node_tracks = tracks.entry(channel.target().node().index()).or_default();

            match outputs {
                ReadOutputs::Translations(values) => {
                    let values = values.map(Vec3::from).collect();
                    node_tracks.translation = Some(Track::new(times, values, interpolation));
                }
                ReadOutputs::Rotations(values) => {
                    let values = values.into_f32().map(Quat::from_array).collect();
                    node_tracks.rotation = Some(Track::new(times, values, interpolation));
                }
                ReadOutputs::Scales(values) => {
                    let values = values.map(Vec3::from).collect();
                    node_tracks.scale = Some(Track::new(times, values, interpolation));
                }
                ReadOutputs::MorphTargetWeights(_) => {} // Ignore weights/morph targets
            }
        }

        let top_level = (0..rig.bone_count())
            .map(|bone| rig.rig().parent_of(BoneId(bone)).is_none())
            .collect();

        Ok(Self {
            fps,
            time: 0.0,
            rest,
            tracks,
            chains: rig.chains().to_vec(),
            top_level,
        })
    }

    /// Node transform at the current time
    fn node_transform(&self, node: usize) -> Option<Mat4> {
        let rest = self.rest.get(node)?;
        let mut translation = rest.translation;
        let mut rotation = rest.rotation;
        let mut scale = rest.scale;

        if let Some(tracks) = self.tracks.get(&node) {
            let t = self.time;
            if let Some(v) = tracks.translation.as_ref().and_then(|k| k.sample(t, Vec3::lerp)) {
                translation = v;
            }
            if let Some(v) = tracks.rotation.as_ref().and_then(|k| k.sample(t, Quat::slerp)) {
                rotation = v.normalize();
            }
            if let Some(v) = tracks.scale.as_ref().and_then(|k| k.sample(t, Vec3::lerp)) {
                scale = v;
            }
        }

        Some(Mat4::from_scale_rotation_translation(
            scale,
            rotation,
            translation,
        ))
    }
}

impl PoseProvider for GltfPose {
    fn set_frame(&mut self, frame: i32) {
        self.time = frame as f32 / self.fps;
    }

    fn local_transform(&self, bone: BoneId) -> Option<Mat4> {
        let chain = self.chains.get(bone.0)?;
        let basis = if self.top_level.get(bone.0).copied().unwrap_or(false) {
            Y_UP_TO_Z_UP
        } else {
            Mat4::IDENTITY
        };
        chain.iter().try_fold(basis, |acc, &node| {
            self.node_transform(node).map(|m| acc * m)
        })
    }

    fn frame_rate(&self) -> f32 {
        self.fps
    }
}

/// One animation to export from a loaded scene
#[derive(Clone, Debug)]
pub struct ClipExport<'a> {
    pub animation_name: &'a str,
    pub fps: f32,
    /// Inclusive frame range; the whole clip when `None`
    pub frame_range: Option<(i32, i32)>,
    pub options: EggOptions,
}

/// Sample an animation of `scene` and write it as `.egg` text to `sink`
pub fn export_clip<S>(
    scene: &GltfScene,
    rig: &GltfRig,
    clip: &ClipExport<'_>,
    sink: &mut S,
) -> Result<ExportSummary, ExportError>
where
    S: TextSink + ?Sized,
{
    let info = scene
        .animation_info(clip.animation_name)
        .ok_or_else(|| ExportError::MissingSource(clip.animation_name.to_string()))?;
    let (frame_from, frame_to) = clip.frame_range.unwrap_or_else(|| info.frame_range(clip.fps));

    let mut pose = GltfPose::new(scene, rig, clip.animation_name, clip.fps)?;
    let request = ExportRequest {
        animation_name: clip.animation_name.to_string(),
        frame_from,
        frame_to,
        options: clip.options.clone(),
    };
    export_animation(&request, &mut pose, rig, sink)
}

/// Frame range with either end overridden; `None` keeps the whole clip
///
/// A missing start defaults to frame 0, a missing end to the clip's last frame.
pub fn frame_range(
    scene: &GltfScene,
    animation_name: &str,
    fps: f32,
    frame_from: Option<i32>,
    frame_to: Option<i32>,
) -> Option<(i32, i32)> {
    if frame_from.is_none() && frame_to.is_none() {
        return None;
    }
    let clip_end = scene
        .animation_info(animation_name)
        .map(|info| info.frame_range(fps).1)
        .unwrap_or(0);
    Some((frame_from.unwrap_or(0), frame_to.unwrap_or(clip_end)))
}

/// Bundle name: explicit, else skin name
pub fn bundle_name(explicit: Option<&str>, rig: &GltfRig) -> String {
    explicit.map(str::to_owned).unwrap_or_else(|| rig.name.clone())
}

/// Load a glTF file and build its rig
pub fn load_rig(input: &std::path::Path, skin: Option<&str>) -> Result<(GltfScene, GltfRig)> {
    let scene = GltfScene::load(input)?;
    let rig = GltfRig::from_scene(&scene, skin)
        .with_context(|| format!("Failed to build rig from {:?}", input))?;
    Ok((scene, rig))
}
