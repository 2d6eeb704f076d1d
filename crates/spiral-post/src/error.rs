//! Error types for the post-processing transforms.

use spiral_gcode::GcodeError;
use thiserror::Error;

/// Errors that can occur while post-processing a document.
///
/// Geometric rejections are not errors; they are reported through the
/// outcome types of each transform.
#[derive(Error, Debug)]
pub enum PostError {
    /// Invalid post-processing settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Writing a record back into its layer failed.
    #[error(transparent)]
    Gcode(#[from] GcodeError),
}

/// Result type for post-processing operations.
pub type Result<T> = std::result::Result<T, PostError>;
