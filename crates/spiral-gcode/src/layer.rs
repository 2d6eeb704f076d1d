//! A single printed layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GcodeError, Result};
use crate::flavor::Markers;
use crate::record::{self, MotionRecord, Origin};

/// The lines of one layer, from its layer change marker up to the next.
///
/// The layer is the only owner of its lines. Motion records are derived
/// from the current lines on every request and written back through
/// [`Layer::rewrite`], so bound line indices never go stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    lines: Vec<String>,
    z: f64,
    height: f64,
}

impl Layer {
    /// Create a layer, reading its nominal Z and thickness declarations.
    ///
    /// Missing or unparseable declarations default to zero.
    pub fn new(lines: Vec<String>, markers: &Markers) -> Self {
        let z = declaration(&lines, &markers.z).unwrap_or(0.0);
        let height = declaration(&lines, &markers.height).unwrap_or(0.0);
        Self { lines, z, height }
    }

    /// Current lines, in print order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Nominal height above the bed (mm).
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Layer thickness (mm).
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Motion records in line order, optionally only the planar ones.
    pub fn records(&self, planar_only: bool) -> Vec<MotionRecord> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| MotionRecord::parse(line, i))
            .filter(|r| !planar_only || r.is_planar())
            .collect()
    }

    /// Motion records carrying both X and Y.
    pub fn planar_records(&self) -> Vec<MotionRecord> {
        self.records(true)
    }

    /// Planar path length of this layer (mm).
    pub fn path_length(&self) -> f64 {
        record::path_length(&self.planar_records())
    }

    /// Does this layer extrude continuously from some move to its end?
    ///
    /// True iff, among planar moves, the first extruding move is followed
    /// only by extruding moves. A layer that never extrudes is not single
    /// extrusion.
    pub fn is_single_extrusion(&self) -> bool {
        let records = self.planar_records();
        match records.iter().position(|r| r.e.is_some()) {
            Some(first) => records[first..].iter().all(|r| r.e.is_some()),
            None => false,
        }
    }

    /// Write `record` back: in place if bound to a line, appended otherwise.
    pub fn rewrite(&mut self, record: &MotionRecord) -> Result<()> {
        match record.origin {
            Origin::Line(index) => {
                let len = self.lines.len();
                let line = self
                    .lines
                    .get_mut(index)
                    .ok_or(GcodeError::LineOutOfRange { index, len })?;
                *line = record.to_string();
            }
            Origin::Synthesized => self.lines.push(record.to_string()),
        }
        Ok(())
    }

    /// Per-layer statistics.
    pub fn info(&self) -> LayerInfo {
        LayerInfo {
            z: self.z,
            height: self.height,
            line_count: self.lines.len(),
            single_extrusion: self.is_single_extrusion(),
            path_length: self.path_length(),
        }
    }
}

/// Summary of one layer, for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Nominal Z (mm).
    pub z: f64,
    /// Thickness (mm).
    pub height: f64,
    /// Number of lines.
    pub line_count: usize,
    /// Eligible for vase treatment.
    pub single_extrusion: bool,
    /// Planar path length (mm).
    pub path_length: f64,
}

impl fmt::Display for LayerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer Z: {} Height: {} Line Count: {} Single Extrusion: {} Path Length: {:.3}",
            self.z, self.height, self.line_count, self.single_extrusion, self.path_length
        )
    }
}

fn declaration(lines: &[String], marker: &str) -> Option<f64> {
    lines
        .iter()
        .find_map(|line| line.strip_prefix(marker))
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn layer(lines: &[&str]) -> Layer {
        Layer::new(
            lines.iter().map(|l| l.to_string()).collect(),
            &Markers::default(),
        )
    }

    fn extrusion_pattern(pattern: &[bool]) -> Layer {
        let mut lines = vec![";LAYER_CHANGE".to_string()];
        for (i, extrudes) in pattern.iter().enumerate() {
            if *extrudes {
                lines.push(format!("G1 X{} Y0 E0.1", i));
            } else {
                lines.push(format!("G1 X{} Y0 F6000", i));
            }
        }
        Layer::new(lines, &Markers::default())
    }

    #[test]
    fn test_declarations() {
        let l = layer(&[";LAYER_CHANGE", ";Z:1.4", ";HEIGHT:0.2", "G1 X0 Y0"]);
        assert_relative_eq!(l.z(), 1.4);
        assert_relative_eq!(l.height(), 0.2);

        let bare = layer(&[";LAYER_CHANGE", "G1 X0 Y0"]);
        assert_eq!(bare.z(), 0.0);
        assert_eq!(bare.height(), 0.0);
    }

    #[test]
    fn test_records_planar_filter() {
        let l = layer(&[
            ";LAYER_CHANGE",
            "G1 Z.4 F720",
            "M106 S255",
            "G1 X1 Y1 E.1",
            "G1 E-.8 F2100",
            "G1 X2 Y1 E.1",
        ]);
        let all = l.records(false);
        assert_eq!(all.len(), 4);
        let planar = l.planar_records();
        assert_eq!(planar.len(), 2);
        assert_eq!(planar[0].origin, Origin::Line(3));
        assert_eq!(planar[1].origin, Origin::Line(5));
    }

    #[test]
    fn test_single_extrusion() {
        assert!(extrusion_pattern(&[false, false, true, true, true]).is_single_extrusion());
        assert!(!extrusion_pattern(&[false, true, false, true]).is_single_extrusion());
        assert!(!extrusion_pattern(&[false, false, false]).is_single_extrusion());
        assert!(!extrusion_pattern(&[]).is_single_extrusion());
    }

    #[test]
    fn test_rewrite_in_place_keeps_other_lines() {
        let mut l = layer(&[";LAYER_CHANGE", ";Z:0.6", "G1 X1 Y1 E.1", "; note"]);
        let mut r = l.planar_records().remove(0);
        r.z = Some(0.65);
        l.rewrite(&r).unwrap();
        assert_eq!(l.lines(), &[";LAYER_CHANGE", ";Z:0.6", "G1 X1 Y1 Z0.65 E0.1", "; note"]);
    }

    #[test]
    fn test_rewrite_synthesized_appends() {
        let mut l = layer(&[";LAYER_CHANGE", "G1 X1 Y1 E.1"]);
        let r = MotionRecord {
            x: Some(2.0),
            y: Some(1.0),
            ..MotionRecord::synthesized()
        };
        l.rewrite(&r).unwrap();
        assert_eq!(l.lines().len(), 3);
        assert_eq!(l.lines()[2], "G1 X2 Y1");
        assert_eq!(l.planar_records()[0].origin, Origin::Line(1));
    }

    #[test]
    fn test_rewrite_out_of_range() {
        let mut l = layer(&[";LAYER_CHANGE"]);
        let r = MotionRecord {
            origin: Origin::Line(4),
            ..MotionRecord::synthesized()
        };
        assert_eq!(
            l.rewrite(&r),
            Err(GcodeError::LineOutOfRange { index: 4, len: 1 })
        );
    }

    #[test]
    fn test_info() {
        let l = layer(&[";LAYER_CHANGE", ";Z:0.2", ";HEIGHT:0.2", "G1 X0 Y0", "G1 X3 Y4 E.2"]);
        let info = l.info();
        assert_eq!(info.line_count, 5);
        assert!(info.single_extrusion);
        assert_relative_eq!(info.path_length, 5.0);
        assert!(info.to_string().starts_with("Layer Z: 0.2 Height: 0.2 Line Count: 5"));
    }
}
