//! Bone hierarchy from a glTF skin
//!
//! Skin joints become rig bones. A joint's rig parent is its nearest ancestor
//! node that is also a joint; nodes in between (and, for top-level joints,
//! every ancestor up to the scene root) are folded into the joint's local
//! transform so that top-level bones are expressed in world space. The Y-up to
//! Z-up basis change is applied on top of that by the pose sampler.

use anyhow::{bail, Result};
use egg_anim::{BoneId, Rig, TopologyProvider};
use hashbrown::{HashMap, HashSet};

use crate::scene::GltfScene;

/// Rig built from one glTF skin
#[derive(Clone, Debug)]
pub struct GltfRig {
    /// Skin name, or `skin_<index>` for unnamed skins
    pub name: String,
    rig: Rig,
    /// Per bone: node indices from the outermost folded ancestor down to the
    /// joint itself
    chains: Vec<Vec<usize>>,
}

impl GltfRig {
    /// Build the rig for the named skin (first skin when `None`)
    pub fn from_scene(scene: &GltfScene, skin_name: Option<&str>) -> Result<Self> {
        let skin = scene.skin(skin_name)?;
        let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
        if joints.is_empty() {
            bail!("No bones found in skin");
        }

        let mut parents: HashMap<usize, usize> = HashMap::new();
        for node in scene.document.nodes() {
            for child in node.children() {
                parents.insert(child.index(), node.index());
            }
        }

        let names = unique_joint_names(scene, &joints);
        let joint_set: HashSet<usize> = joints.iter().copied().collect();

        // Joint parents are resolved first so every parent is added to the rig
        // before its children.
        let mut joint_parent: HashMap<usize, Option<usize>> = HashMap::new();
        let mut chains_by_joint: HashMap<usize, Vec<usize>> = HashMap::new();
        for &joint in &joints {
            let mut chain = vec![joint];
            let mut parent = None;
            let mut current = joint;
            while let Some(&up) = parents.get(&current) {
                if joint_set.contains(&up) {
                    parent = Some(up);
                    break;
                }
                chain.push(up);
                current = up;
            }
            chain.reverse();
            joint_parent.insert(joint, parent);
            chains_by_joint.insert(joint, chain);
        }

        let mut rig = Rig::new();
        let mut chains = Vec::with_capacity(joints.len());
        let mut bone_of: HashMap<usize, BoneId> = HashMap::new();
        let mut pending: Vec<usize> = joints.clone();
        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();
            for joint in pending {
                let parent_bone = match joint_parent[&joint] {
                    None => None,
                    Some(p) => match bone_of.get(&p) {
                        Some(&bone) => Some(bone),
                        None => {
                            waiting.push(joint);
                            continue;
                        }
                    },
                };
                let bone = rig.add_bone(names[&joint].clone(), parent_bone)?;
                bone_of.insert(joint, bone);
                chains.push(chains_by_joint[&joint].clone());
            }
            if waiting.len() == before {
                bail!("Skin joint hierarchy contains a cycle");
            }
            pending = waiting;
        }

        Ok(Self {
            name: skin
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("skin_{}", skin.index())),
            rig,
            chains,
        })
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn bone_count(&self) -> usize {
        self.rig.len()
    }

    /// Nodes whose transforms compose the bone's local transform
    pub fn chain(&self, bone: BoneId) -> Option<&[usize]> {
        self.chains.get(bone.0).map(Vec::as_slice)
    }

    pub(crate) fn chains(&self) -> &[Vec<usize>] {
        &self.chains
    }
}

impl TopologyProvider for GltfRig {
    fn top_level_bones(&self) -> Vec<BoneId> {
        self.rig.top_level_bones()
    }

    fn children_of(&self, bone: BoneId) -> Vec<BoneId> {
        self.rig.children_of(bone)
    }

    fn name_of(&self, bone: BoneId) -> &str {
        self.rig.name_of(bone)
    }
}

/// Node names of the joints, made unique; unnamed joints become `bone_<node>`
///
/// A repeated name gets the node index appended, then a counter if that is
/// taken too.
fn unique_joint_names(scene: &GltfScene, joints: &[usize]) -> HashMap<usize, String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut names = HashMap::new();
    for &joint in joints {
        let base = scene
            .document
            .nodes()
            .nth(joint)
            .and_then(|n| n.name().map(str::to_owned))
            .unwrap_or_else(|| format!("bone_{}", joint));

        let mut name = base.clone();
        let mut attempt = 0;
        while used.contains(&name) {
            name = if attempt == 0 {
                format!("{}_{}", base, joint)
            } else {
                format!("{}_{}_{}", base, joint, attempt)
            };
            attempt += 1;
        }
        if name != base {
            tracing::warn!("Duplicate joint name '{}' in skin, exported as '{}'", base, name);
        }

        used.insert(name.clone());
        names.insert(joint, name);
    }
    names
}
