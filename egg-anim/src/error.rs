//! Error types for animation capture and export

use std::io;
use std::path::PathBuf;

/// Errors that abort a single animation export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// `frame_to` precedes `frame_from`
    #[error("invalid frame range {from}..={to} (frame_to must not precede frame_from)")]
    InvalidRange { from: i32, to: i32 },

    /// Frame rate is zero, negative or not finite
    #[error("invalid frame rate {0} (must be positive)")]
    InvalidFrameRate(f32),

    /// Two bones of one rig share a name
    #[error("bone name \"{0}\" is used by more than one bone")]
    DuplicateBone(String),

    /// Requested animation does not exist in the source
    #[error("animation not found: \"{0}\"")]
    MissingSource(String),

    /// Destination could not be created or written
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
