//! egg-export library
//!
//! glTF-backed pose and rig providers for `egg-anim`, plus the batch
//! manifest used by the `egg-export` command.

pub mod animation;
pub mod manifest;
pub mod scene;
pub mod skeleton;

// Re-export key types for glTF animation export
pub use animation::{export_clip, load_rig, ClipExport, GltfPose, DEFAULT_FRAME_RATE};
pub use manifest::{build_all, check, BatchReport, ExportManifest};
pub use scene::{list_animations, AnimationInfo, GltfScene};
pub use skeleton::GltfRig;
