#![warn(missing_docs)]

//! Post-processing of sliced G-code for single-extrusion layers.
//!
//! This crate rewrites the moves of a [`Document`] to:
//! 1. bridge the gap between consecutive single-extrusion layers,
//! 2. interpolate Z across runs of such layers to print them as a
//!    continuous spiral (vase mode),
//! 3. align the seam of each spiral layer with the start of the next.
//!
//! # Example
//!
//! ```ignore
//! use spiral_gcode::Document;
//! use spiral_post::{run, Operation, PostSettings};
//!
//! let settings = PostSettings::default();
//! let mut doc = Document::parse(&std::fs::read_to_string("part.gcode")?, &settings.markers)?;
//! let report = run(&mut doc, Operation::AlignedVase, &settings)?;
//! println!("{report}");
//! std::fs::write("part.gcode", doc.reassemble().join("\n"))?;
//! ```

pub mod connect;
pub mod error;
pub mod seam;
pub mod settings;
pub mod vase;

pub use connect::{connect, connect_layers, ConnectOutcome};
pub use error::{PostError, Result};
pub use seam::{align_layer, AlignOutcome};
pub use settings::{AlignSettings, ConnectSettings, PostSettings, VaseSettings};
pub use vase::{
    find_eligible_runs, layer_weight, transform_run, vase_layer, vase_layers, RunReport,
    VaseReport,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use spiral_gcode::Document;

/// Post-processing operation applied to a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Bridge consecutive single-extrusion layers.
    Connect,
    /// Interpolate Z across runs of single-extrusion layers.
    Vase,
    /// Vase mode with seam alignment between layers.
    AlignedVase,
}

impl FromStr for Operation {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "connect" => Ok(Operation::Connect),
            "vase" => Ok(Operation::Vase),
            "aligned-vase" | "aligned" | "align" => Ok(Operation::AlignedVase),
            other => Err(PostError::InvalidSettings(format!(
                "unknown operation: {other}"
            ))),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Connect => "connect",
            Operation::Vase => "vase",
            Operation::AlignedVase => "aligned-vase",
        })
    }
}

/// What an operation did to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum PostReport {
    /// Result of [`Operation::Connect`].
    Connect {
        /// Bridges appended.
        connected: usize,
    },
    /// Result of [`Operation::Vase`] or [`Operation::AlignedVase`].
    Vase(VaseReport),
}

impl fmt::Display for PostReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostReport::Connect { connected } => write!(f, "connected {} layers", connected),
            PostReport::Vase(report) => fmt::Display::fmt(report, f),
        }
    }
}

/// Validate `settings` and apply `operation` to every layer of `document`.
pub fn run(
    document: &mut Document,
    operation: Operation,
    settings: &PostSettings,
) -> Result<PostReport> {
    settings.validate()?;
    let layers = document.layers_mut();
    tracing::info!(%operation, layers = layers.len(), "post-processing");

    let report = match operation {
        Operation::Connect => PostReport::Connect {
            connected: connect_layers(layers, &settings.connect)?,
        },
        Operation::Vase => PostReport::Vase(vase_layers(layers, settings, false)?),
        Operation::AlignedVase => PostReport::Vase(vase_layers(layers, settings, true)?),
    };
    Ok(report)
}
