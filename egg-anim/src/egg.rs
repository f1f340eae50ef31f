//! Panda3D `.egg` animation table writer
//!
//! See <https://github.com/panda3d/panda3d/blob/master/panda/src/doc/eggSyntax.txt>.
//!
//! # Layout
//! ```text
//! <Comment> {"walk" by egg-export}
//! <CoordinateSystem> { Z-up }
//! <Table> {
//!     <Bundle> Armature {
//!         <Table> "<skeleton>" {
//!             <Table> root {
//!                 <Xfm$Anim_S$> xform {
//!                     <Scalar> fps { 24 }
//!                     <Scalar> order { sprht }
//!                     <S$Anim> i { <V> { 1.0000 } }
//!                     <S$Anim> h { <V> { 0.0000 15.0000 30.0000 } }
//!                 }
//!                 <Table> child {
//!                     ...
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! Indentation is one tab per level. Child bone tables follow their parent's
//! `<Xfm$Anim_S$>` block inside the parent's table.

use std::borrow::Cow;
use std::fmt::{self, Write};

use crate::bone::BoneAnimation;
use crate::capture::AnimationCapture;
use crate::channel::CHANNEL_ORDER;
use crate::provider::{BoneId, TopologyProvider};

/// Names written around the skeleton table
#[derive(Clone, Debug)]
pub struct EggOptions {
    /// `<Bundle>` name, normally the animated object's name
    pub bundle_name: String,
    /// Tool name quoted in the leading comment
    pub tool_name: String,
}

impl EggOptions {
    pub fn new(bundle_name: impl Into<String>) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            tool_name: concat!("egg-anim ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = tool_name.into();
        self
    }
}

/// Encode a capture as `.egg` text
pub fn encode_egg_animation<T>(capture: &AnimationCapture, rig: &T, options: &EggOptions) -> String
where
    T: TopologyProvider + ?Sized,
{
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_egg_animation(&mut out, capture, rig, options);
    out
}

/// Write a capture as `.egg` text, bones nested by `rig` topology
pub fn write_egg_animation<W, T>(
    w: &mut W,
    capture: &AnimationCapture,
    rig: &T,
    options: &EggOptions,
) -> fmt::Result
where
    W: Write,
    T: TopologyProvider + ?Sized,
{
    writeln!(
        w,
        "<Comment> {{\"{}\" by {}}}",
        escape(&capture.name),
        options.tool_name
    )?;
    writeln!(w, "<CoordinateSystem> {{ Z-up }}")?;
    writeln!(w, "<Table> {{")?;
    writeln!(w, "\t<Bundle> {} {{", egg_name(&options.bundle_name))?;
    writeln!(w, "\t\t<Table> \"<skeleton>\" {{")?;

    for bone in rig.top_level_bones() {
        write_bone_table(w, capture, rig, bone, 3)?;
    }

    writeln!(w, "\t\t}}")?;
    writeln!(w, "\t}}")?;
    writeln!(w, "}}")
}

fn write_bone_table<W, T>(
    w: &mut W,
    capture: &AnimationCapture,
    rig: &T,
    bone: BoneId,
    depth: usize,
) -> fmt::Result
where
    W: Write,
    T: TopologyProvider + ?Sized,
{
    let name = rig.name_of(bone);
    indent(w, depth)?;
    writeln!(w, "<Table> {} {{", egg_name(name))?;

    write_xfm_anim(w, capture.fps, capture.bone(name), depth + 1)?;
    for child in rig.children_of(bone) {
        write_bone_table(w, capture, rig, child, depth + 1)?;
    }

    indent(w, depth)?;
    writeln!(w, "}}")
}

/// `<Xfm$Anim_S$>` block; a missing node is written without channels
fn write_xfm_anim<W: Write>(
    w: &mut W,
    fps: f32,
    bone: Option<&BoneAnimation>,
    depth: usize,
) -> fmt::Result {
    indent(w, depth)?;
    writeln!(w, "<Xfm$Anim_S$> xform {{")?;
    indent(w, depth + 1)?;
    writeln!(w, "<Scalar> fps {{ {} }}", fps)?;
    indent(w, depth + 1)?;
    writeln!(w, "<Scalar> order {{ {} }}", CHANNEL_ORDER)?;

    if let Some(bone) = bone {
        for (channel, envelope) in bone.envelopes() {
            indent(w, depth + 1)?;
            write!(w, "<S$Anim> {} {{ <V> {{", channel)?;
            for &value in envelope.values() {
                write!(w, " {:.4}", without_negative_zero(value))?;
            }
            writeln!(w, " }} }}")?;
        }
    }

    indent(w, depth)?;
    writeln!(w, "}}")
}

/// Values that print as zero are written as `0.0000`, never `-0.0000`
fn without_negative_zero(value: f32) -> f32 {
    if value.abs() < 0.00005 { 0.0 } else { value }
}

fn indent<W: Write>(w: &mut W, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        w.write_char('\t')?;
    }
    Ok(())
}

/// Quote a name when egg syntax requires it
fn egg_name(name: &str) -> Cow<'_, str> {
    let needs_quotes = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '<' | '>' | '"'));
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", escape(name)))
    } else {
        Cow::Borrowed(name)
    }
}

fn escape(text: &str) -> Cow<'_, str> {
    if text.contains(['"', '\\']) {
        Cow::Owned(text.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        Cow::Borrowed(text)
    }
}
