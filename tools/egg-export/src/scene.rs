//! Loaded glTF document with skin and animation lookups

use anyhow::{Context, Result};
use std::path::Path;

/// Summary of one animation clip in a glTF file
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationInfo {
    pub index: usize,
    pub name: String,
    pub channel_count: usize,
    /// Time of the last keyframe, in seconds
    pub duration: f32,
}

impl AnimationInfo {
    /// Inclusive frame range covering the clip at `fps`, starting at frame 0
    pub fn frame_range(&self, fps: f32) -> (i32, i32) {
        (0, (self.duration * fps).round() as i32)
    }
}

/// glTF document plus its buffers
#[derive(Debug)]
pub struct GltfScene {
    pub(crate) document: gltf::Document,
    pub(crate) buffers: Vec<gltf::buffer::Data>,
}

impl GltfScene {
    pub fn load(path: &Path) -> Result<Self> {
        let (document, buffers, _images) =
            gltf::import(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;
        Ok(Self {
            document,
            buffers,
        })
    }

    /// Find skin by name or use first
    pub fn skin(&self, name: Option<&str>) -> Result<gltf::Skin<'_>> {
        if let Some(name) = name {
            self.document
                .skins()
                .find(|s| s.name() == Some(name))
                .with_context(|| format!("Skin '{}' not found in glTF", name))
        } else {
            self.document
                .skins()
                .next()
                .context("No skins found in glTF file")
        }
    }

    /// Find an animation by the name reported in [`GltfScene::animations`]
    pub fn find_animation(&self, name: &str) -> Option<gltf::Animation<'_>> {
        self.document
            .animations()
            .find(|a| animation_name(a) == name)
    }

    pub fn animations(&self) -> Vec<AnimationInfo> {
        self.document
            .animations()
            .map(|anim| AnimationInfo {
                index: anim.index(),
                name: animation_name(&anim),
                channel_count: anim.channels().count(),
                duration: self.duration(&anim),
            })
            .collect()
    }

    pub fn animation_info(&self, name: &str) -> Option<AnimationInfo> {
        self.animations().into_iter().find(|info| info.name == name)
    }

    /// Time of the last keyframe of any channel
    fn duration(&self, animation: &gltf::Animation) -> f32 {
        animation
            .channels()
            .filter_map(|channel| {
                let reader = channel.reader(|buffer| Some(&self.buffers[buffer.index()]));
                reader.read_inputs().and_then(|times| times.last())
            })
            .fold(0.0f32, f32::max)
    }
}

/// Animation name, or `animation_<index>` for unnamed clips
pub fn animation_name(animation: &gltf::Animation) -> String {
    animation
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("animation_{}", animation.index()))
}

/// List available animations in a glTF file
pub fn list_animations(input: &Path, fps: f32) -> Result<()> {
    let scene = GltfScene::load(input)?;
    let animations = scene.animations();
    if animations.is_empty() {
        tracing::info!("No animations found in {:?}", input);
        return Ok(());
    }

    tracing::info!("Animations in {:?}:", input);
    for info in &animations {
        let (from, to) = info.frame_range(fps);
        tracing::info!(
            "  [{}] '{}': {} channels, {:.2}s, frames {}..={} at {} fps",
            info.index,
            info.name,
            info.channel_count,
            info.duration,
            from,
            to,
            fps
        );
    }

    Ok(())
}
