#![warn(missing_docs)]

//! Layered G-code document model for the spiral post-processor.
//!
//! This crate splits sliced G-code into an intro block, one [`Layer`] per
//! layer change marker, and an outro block, and exposes the linear moves
//! of each layer as typed [`MotionRecord`]s that can be edited and
//! written back without disturbing any other line.
//!
//! # Example
//!
//! ```
//! use spiral_gcode::{Document, Markers};
//!
//! let text = "G28\n;LAYER_CHANGE\n;Z:0.2\nG1 X1 Y1\nG1 X2 Y1 E.1\n";
//! let mut doc = Document::parse(text, &Markers::default())?;
//!
//! let layer = &mut doc.layers_mut()[0];
//! let mut last = layer.planar_records().pop().unwrap();
//! last.z = Some(0.25);
//! layer.rewrite(&last)?;
//!
//! assert_eq!(doc.reassemble()[4], "G1 X2 Y1 Z0.25 E0.1");
//! # Ok::<(), spiral_gcode::GcodeError>(())
//! ```

pub mod document;
pub mod error;
pub mod flavor;
pub mod layer;
pub mod record;

pub use document::Document;
pub use error::{GcodeError, Result};
pub use flavor::{Markers, SlicerFlavor};
pub use layer::{Layer, LayerInfo};
pub use record::{path_length, MotionRecord, Origin};
