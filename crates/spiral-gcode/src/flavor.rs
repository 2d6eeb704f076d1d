//! Slicer flavor definitions.
//!
//! Each slicer annotates its output with its own comment markers. The
//! document model only ever matches these by line prefix.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GcodeError;

/// Structural comment markers recognized in slicer output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Prefix of the line that starts every layer.
    pub layer_change: String,
    /// Prefix of the line that ends the executable block, if the slicer emits one.
    pub end_of_block: Option<String>,
    /// Prefix of the nominal layer Z declaration.
    pub z: String,
    /// Prefix of the layer thickness declaration.
    pub height: String,
}

impl Default for Markers {
    fn default() -> Self {
        SlicerFlavor::default().markers()
    }
}

impl Markers {
    /// Does `line` start a new layer?
    pub fn is_layer_change(&self, line: &str) -> bool {
        line.starts_with(&self.layer_change)
    }

    /// Does `line` end the executable block?
    pub fn is_end_of_block(&self, line: &str) -> bool {
        self.end_of_block
            .as_deref()
            .is_some_and(|marker| line.starts_with(marker))
    }
}

/// Slicer flavor (dialect of structural comments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlicerFlavor {
    /// OrcaSlicer and Bambu Studio.
    #[default]
    Orca,
    /// PrusaSlicer and SuperSlicer.
    Prusa,
}

impl SlicerFlavor {
    /// Get the marker set this slicer emits.
    pub fn markers(&self) -> Markers {
        match self {
            SlicerFlavor::Orca => Markers {
                layer_change: ";LAYER_CHANGE".into(),
                end_of_block: Some("; EXECUTABLE_BLOCK_END".into()),
                z: ";Z:".into(),
                height: ";HEIGHT:".into(),
            },
            SlicerFlavor::Prusa => Markers {
                layer_change: ";LAYER_CHANGE".into(),
                end_of_block: None,
                z: ";Z:".into(),
                height: ";HEIGHT:".into(),
            },
        }
    }
}

impl FromStr for SlicerFlavor {
    type Err = GcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "orca" | "bambu" | "orcaslicer" => Ok(SlicerFlavor::Orca),
            "prusa" | "prusaslicer" | "superslicer" => Ok(SlicerFlavor::Prusa),
            other => Err(GcodeError::UnknownFlavor(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers() {
        let markers = Markers::default();
        assert!(markers.is_layer_change(";LAYER_CHANGE"));
        assert!(!markers.is_layer_change("; LAYER_CHANGE"));
        assert!(markers.is_end_of_block("; EXECUTABLE_BLOCK_END"));
    }

    #[test]
    fn test_prusa_has_no_end_marker() {
        let markers = SlicerFlavor::Prusa.markers();
        assert!(!markers.is_end_of_block("; EXECUTABLE_BLOCK_END"));
    }

    #[test]
    fn test_parse_flavor() {
        assert_eq!("Bambu".parse::<SlicerFlavor>().unwrap(), SlicerFlavor::Orca);
        assert_eq!("prusa".parse::<SlicerFlavor>().unwrap(), SlicerFlavor::Prusa);
        assert!("cura".parse::<SlicerFlavor>().is_err());
    }
}
