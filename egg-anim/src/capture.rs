//! Frame-by-frame animation capture
//!
//! An [`AnimationCapture`] steps a [`PoseProvider`] through an inclusive frame
//! range and accumulates the decomposed transform of every rig bone into
//! per-channel envelopes.

use hashbrown::{HashMap, HashSet};

use crate::bone::BoneAnimation;
use crate::channel::{decompose, Channel};
use crate::error::ExportError;
use crate::provider::{BoneId, PoseProvider, TopologyProvider};

/// Sampled animation of a whole rig
#[derive(Clone, Debug)]
pub struct AnimationCapture {
    /// Source animation (action) name
    pub name: String,
    /// First sampled frame, inclusive
    pub frame_from: i32,
    /// Last sampled frame, inclusive
    pub frame_to: i32,
    /// Frames per second written to the output
    pub fps: f32,
    bones: Vec<BoneAnimation>,
    bone_names: Vec<String>,
    index: HashMap<String, usize>,
    unresolved: Vec<String>,
}

/// Channel whose stored length disagrees with the sampled frame range
#[derive(Clone, Debug, PartialEq)]
pub struct FrameCountMismatch {
    pub bone: String,
    pub channel: Channel,
    pub expected: usize,
    pub actual: usize,
}

impl AnimationCapture {
    /// Create an empty capture for `frame_from..=frame_to`
    pub fn new(
        name: impl Into<String>,
        frame_from: i32,
        frame_to: i32,
        fps: f32,
    ) -> Result<Self, ExportError> {
        if frame_to < frame_from {
            return Err(ExportError::InvalidRange {
                from: frame_from,
                to: frame_to,
            });
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ExportError::InvalidFrameRate(fps));
        }

        Ok(Self {
            name: name.into(),
            frame_from,
            frame_to,
            fps,
            bones: Vec::new(),
            bone_names: Vec::new(),
            index: HashMap::new(),
            unresolved: Vec::new(),
        })
    }

    /// Number of frames in the range
    pub fn frame_count(&self) -> usize {
        (i64::from(self.frame_to) - i64::from(self.frame_from) + 1) as usize
    }

    /// Get the bone's node, creating it on first access
    pub fn bone_mut(&mut self, name: &str) -> &mut BoneAnimation {
        let index = match self.index.get(name) {
            Some(&index) => index,
            None => {
                let index = self.bones.len();
                self.bones.push(BoneAnimation::new());
                self.bone_names.push(name.to_owned());
                self.index.insert(name.to_owned(), index);
                index
            }
        };
        &mut self.bones[index]
    }

    pub fn bone(&self, name: &str) -> Option<&BoneAnimation> {
        self.index.get(name).map(|&index| &self.bones[index])
    }

    /// Recorded bones in first-sampled order
    pub fn bones(&self) -> impl Iterator<Item = (&str, &BoneAnimation)> + '_ {
        self.bone_names
            .iter()
            .map(String::as_str)
            .zip(self.bones.iter())
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Bones the pose provider could not resolve; their channels are empty
    pub fn unresolved_bones(&self) -> &[String] {
        &self.unresolved
    }

    /// Sample every frame of the range for every bone of `rig`
    ///
    /// Frames are visited in ascending order. A bone whose transform is
    /// missing on any frame keeps an empty node instead of failing the export.
    /// A rig with two bones of the same name is rejected before any frame is
    /// sampled.
    pub fn sample<P, T>(&mut self, pose: &mut P, rig: &T) -> Result<(), ExportError>
    where
        P: PoseProvider + ?Sized,
        T: TopologyProvider + ?Sized,
    {
        let bones = rig.depth_first();
        let mut names: HashSet<&str> = HashSet::with_capacity(bones.len());
        for &bone in &bones {
            let name = rig.name_of(bone);
            if !names.insert(name) {
                return Err(ExportError::DuplicateBone(name.to_owned()));
            }
        }

        let mut unresolved: HashSet<BoneId> = HashSet::new();

        for frame in self.frame_from..=self.frame_to {
            pose.set_frame(frame);

            for &bone in &bones {
                let Some(transform) = pose.local_transform(bone) else {
                    unresolved.insert(bone);
                    continue;
                };
                let node = self.bone_mut(rig.name_of(bone));
                for (channel, value) in decompose(&transform) {
                    node.add_envelope_value(channel, value);
                }
            }
        }

        for &bone in bones.iter().filter(|b| unresolved.contains(*b)) {
            let name = rig.name_of(bone);
            tracing::warn!(
                "Bone '{}' has no transform in '{}'; exporting it without channels",
                name,
                self.name
            );
            self.bone_mut(name).clear();
            self.unresolved.push(name.to_owned());
        }

        tracing::debug!(
            "Sampled '{}': {} bones, frames {}..={}",
            self.name,
            self.bones.len(),
            self.frame_from,
            self.frame_to
        );
        Ok(())
    }

    /// Varying channels whose length is not the frame count
    ///
    /// Empty for any capture produced by [`AnimationCapture::sample`].
    pub fn frame_count_mismatches(&self) -> Vec<FrameCountMismatch> {
        let expected = self.frame_count();
        self.bones()
            .flat_map(|(name, bone)| {
                bone.envelopes()
                    .filter(move |(_, envelope)| {
                        envelope.sample_count() != expected
                            || (!envelope.is_constant() && envelope.values().len() != expected)
                    })
                    .map(move |(channel, envelope)| FrameCountMismatch {
                        bone: name.to_owned(),
                        channel,
                        expected,
                        actual: envelope.sample_count(),
                    })
            })
            .collect()
    }
}

/// Capture `frame_from..=frame_to` of the current pose source
///
/// The frame rate is taken from `pose`.
pub fn capture_animation<P, T>(
    name: impl Into<String>,
    frame_from: i32,
    frame_to: i32,
    pose: &mut P,
    rig: &T,
) -> Result<AnimationCapture, ExportError>
where
    P: PoseProvider + ?Sized,
    T: TopologyProvider + ?Sized,
{
    let mut capture = AnimationCapture::new(name, frame_from, frame_to, pose.frame_rate())?;
    capture.sample(pose, rig)?;
    Ok(capture)
}
