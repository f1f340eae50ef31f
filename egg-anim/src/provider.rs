//! Host collaborators: pose sampling and rig topology
//!
//! The exporter never talks to a host application directly. A host supplies
//! a [`PoseProvider`] that can be moved to a frame and queried for bone
//! transforms, and a [`TopologyProvider`] describing the bone forest.

use glam::Mat4;

use crate::error::ExportError;

/// Opaque handle of a bone within one rig
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub usize);

/// Pose source that is stepped through frames in order
pub trait PoseProvider {
    /// Move to `frame`. Later queries observe this frame's pose.
    fn set_frame(&mut self, frame: i32);

    /// Transform of `bone` relative to its parent, or to world space for a
    /// top-level bone. `None` when the bone cannot be resolved.
    fn local_transform(&self, bone: BoneId) -> Option<Mat4>;

    /// Frames per second of the source animation
    fn frame_rate(&self) -> f32;
}

/// Parent/child forest of bones
///
/// Bone names identify bones in the output and must be unique within a rig.
pub trait TopologyProvider {
    fn top_level_bones(&self) -> Vec<BoneId>;

    fn children_of(&self, bone: BoneId) -> Vec<BoneId>;

    fn name_of(&self, bone: BoneId) -> &str;

    /// Every bone, parents before children, siblings in provider order
    fn depth_first(&self) -> Vec<BoneId> {
        let mut order = Vec::new();
        let mut stack: Vec<BoneId> = self.top_level_bones().into_iter().rev().collect();
        while let Some(bone) = stack.pop() {
            order.push(bone);
            stack.extend(self.children_of(bone).into_iter().rev());
        }
        order
    }
}

#[derive(Clone, Debug)]
struct RigBone {
    name: String,
    parent: Option<BoneId>,
}

/// In-memory bone forest
///
/// Children are reported in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct Rig {
    bones: Vec<RigBone>,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bone under `parent` (or at top level) and return its handle
    ///
    /// Fails with [`ExportError::DuplicateBone`] when the name is taken.
    ///
    /// # Panics
    /// If `parent` was not returned by this rig.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<BoneId>,
    ) -> Result<BoneId, ExportError> {
        if let Some(parent) = parent {
            assert!(parent.0 < self.bones.len(), "unknown parent bone {parent:?}");
        }
        let name = name.into();
        if self.find(&name).is_some() {
            return Err(ExportError::DuplicateBone(name));
        }
        let id = BoneId(self.bones.len());
        self.bones.push(RigBone { name, parent });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn parent_of(&self, bone: BoneId) -> Option<BoneId> {
        self.bones.get(bone.0).and_then(|b| b.parent)
    }

    /// Look up a bone by name
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.bones.iter().position(|b| b.name == name).map(BoneId)
    }
}

impl TopologyProvider for Rig {
    fn top_level_bones(&self) -> Vec<BoneId> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| BoneId(i))
            .collect()
    }

    fn children_of(&self, bone: BoneId) -> Vec<BoneId> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent == Some(bone))
            .map(|(i, _)| BoneId(i))
            .collect()
    }

    fn name_of(&self, bone: BoneId) -> &str {
        self.bones.get(bone.0).map(|b| b.name.as_str()).unwrap_or("")
    }
}
