//! egg-anim library
//!
//! Samples a skeletal animation frame by frame and encodes it as a Panda3D
//! `.egg` animation table (`<Xfm$Anim_S$>` blocks nested by bone hierarchy).
//!
//! The host application is reached only through [`PoseProvider`] and
//! [`TopologyProvider`], so the same pipeline serves glTF files, editors or
//! test fixtures.

pub mod bone;
pub mod capture;
pub mod channel;
pub mod egg;
pub mod envelope;
pub mod error;
pub mod export;
pub mod provider;
pub mod sink;

pub use bone::BoneAnimation;
pub use capture::{capture_animation, AnimationCapture, FrameCountMismatch};
pub use channel::{decompose, Channel, CHANNEL_COUNT, CHANNEL_ORDER};
pub use egg::{encode_egg_animation, write_egg_animation, EggOptions};
pub use envelope::{Envelope, SAME_VALUE_TOLERANCE};
pub use error::ExportError;
pub use export::{export_animation, ExportRequest, ExportSummary};
pub use provider::{BoneId, PoseProvider, Rig, TopologyProvider};
pub use sink::{FileSink, MemorySink, TextSink};
