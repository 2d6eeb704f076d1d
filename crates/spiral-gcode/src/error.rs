//! Error types for the G-code document model.

use thiserror::Error;

/// Errors that can occur while splitting or editing a G-code document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// The program contains no layer change marker, so it cannot be layered.
    #[error("no layer change marker `{0}` found")]
    NoLayerMarkers(String),

    /// A record is bound to a line the layer does not own.
    #[error("line index {index} out of range for layer with {len} lines")]
    LineOutOfRange {
        /// Bound line index.
        index: usize,
        /// Number of lines in the layer.
        len: usize,
    },

    /// Unrecognized slicer flavor name.
    #[error("unknown slicer flavor: {0}")]
    UnknownFlavor(String),
}

/// Result type for G-code document operations.
pub type Result<T> = std::result::Result<T, GcodeError>;
