//! Transform decomposition into `.egg` animation channels
//!
//! A bone transform is split into nine scalar channels:
//!
//! ```text
//! i, j, k - scale along local x, y, z
//! p, r, h - pitch, roll, heading in degrees
//! x, y, z - translation
//! ```

use glam::{EulerRot, Mat4};
use std::fmt;

/// Number of channels produced per bone per frame
pub const CHANNEL_COUNT: usize = 9;

/// Order tag written into every `<Xfm$Anim_S$>` block
///
/// Scale first, then pitch, roll, heading, then translation.
pub const CHANNEL_ORDER: &str = "sprht";

/// One scalar degree of freedom of a bone transform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    ScaleX,
    ScaleY,
    ScaleZ,
    Pitch,
    Roll,
    Heading,
    TranslateX,
    TranslateY,
    TranslateZ,
}

impl Channel {
    /// All channels in emission order
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::ScaleX,
        Channel::ScaleY,
        Channel::ScaleZ,
        Channel::Pitch,
        Channel::Roll,
        Channel::Heading,
        Channel::TranslateX,
        Channel::TranslateY,
        Channel::TranslateZ,
    ];

    /// Single-letter symbol used in `<S$Anim>` entries
    pub const fn symbol(self) -> char {
        match self {
            Channel::ScaleX => 'i',
            Channel::ScaleY => 'j',
            Channel::ScaleZ => 'k',
            Channel::Pitch => 'p',
            Channel::Roll => 'r',
            Channel::Heading => 'h',
            Channel::TranslateX => 'x',
            Channel::TranslateY => 'y',
            Channel::TranslateZ => 'z',
        }
    }

    /// Slot index of this channel, `0..CHANNEL_COUNT`
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Decompose a local bone transform into channel values
///
/// Rotation uses the X-then-Y-then-Z Euler order (`Rz * Ry * Rx`), with pitch
/// about X, roll about Y and heading about Z. Angles are in degrees.
pub fn decompose(transform: &Mat4) -> [(Channel, f32); CHANNEL_COUNT] {
    let (scale, rotation, translation) = transform.to_scale_rotation_translation();
    let (heading, roll, pitch) = rotation.to_euler(EulerRot::ZYX);

    [
        (Channel::ScaleX, scale.x),
        (Channel::ScaleY, scale.y),
        (Channel::ScaleZ, scale.z),
        (Channel::Pitch, pitch.to_degrees()),
        (Channel::Roll, roll.to_degrees()),
        (Channel::Heading, heading.to_degrees()),
        (Channel::TranslateX, translation.x),
        (Channel::TranslateY, translation.y),
        (Channel::TranslateZ, translation.z),
    ]
}
