//! Linear move records.
//!
//! A [`MotionRecord`] is the typed view of one `G1` line. Parsing keeps
//! only the words the post-processor understands (`X`, `Y`, `Z`, `E`,
//! `F`) plus the trailing comment; serializing writes them back in a
//! fixed order with at most five fractional digits.

use std::fmt;

use spiral_math::{Point2, Vec2, Vec3};

/// Opcode of a linear move.
pub const LINEAR_MOVE: &str = "G1";

/// Start of a G-code comment.
pub const COMMENT_MARKER: char = ';';

/// Fractional digits written for every coordinate.
const PRECISION: usize = 5;

/// Where a record came from, and therefore where it is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Parsed from the layer line at this index; rewritten in place.
    Line(usize),
    /// Created by a transform; appended to the layer.
    Synthesized,
}

/// One linear move with its optional words and comment.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionRecord {
    /// Where this record is written back to.
    pub origin: Origin,
    /// X position (mm).
    pub x: Option<f64>,
    /// Y position (mm).
    pub y: Option<f64>,
    /// Z position (mm).
    pub z: Option<f64>,
    /// Extrusion amount.
    pub e: Option<f64>,
    /// Feed rate (mm/min).
    pub f: Option<f64>,
    /// Comment text after the `;`, verbatim.
    pub comment: Option<String>,
}

impl MotionRecord {
    /// Create an empty synthesized record.
    pub fn synthesized() -> Self {
        Self {
            origin: Origin::Synthesized,
            x: None,
            y: None,
            z: None,
            e: None,
            f: None,
            comment: None,
        }
    }

    /// Parse a `G1` line bound to layer line `index`.
    ///
    /// Returns `None` if the first word is not exactly the linear move
    /// opcode. Malformed words are skipped. The comment starts at the first
    /// word beginning with `;` and runs verbatim to the end of the line.
    pub fn parse(line: &str, index: usize) -> Option<Self> {
        let mut words = line.split_whitespace();
        if words.next()? != LINEAR_MOVE {
            return None;
        }

        let mut record = Self {
            origin: Origin::Line(index),
            ..Self::synthesized()
        };
        for word in words {
            if word.starts_with(COMMENT_MARKER) {
                // `word` borrows from `line`, so its offset locates the marker.
                let start = word.as_ptr() as usize - line.as_ptr() as usize;
                record.comment = Some(line[start + COMMENT_MARKER.len_utf8()..].to_string());
                break;
            }
            match parse_word(word) {
                Some(('X', v)) => record.x = Some(v),
                Some(('Y', v)) => record.y = Some(v),
                Some(('Z', v)) => record.z = Some(v),
                Some(('E', v)) => record.e = Some(v),
                Some(('F', v)) => record.f = Some(v),
                _ => tracing::trace!(word, line, "skipping unrecognized word"),
            }
        }
        Some(record)
    }

    /// X and Y are both present.
    pub fn is_planar(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// X, Y and Z are all present.
    pub fn is_spatial(&self) -> bool {
        self.is_planar() && self.z.is_some()
    }

    /// XY position, if planar.
    pub fn point(&self) -> Option<Point2> {
        Some(Point2::new(self.x?, self.y?))
    }

    /// Overwrite the XY position.
    pub fn set_point(&mut self, p: Point2) {
        self.x = Some(p.x);
        self.y = Some(p.y);
    }

    /// XY displacement from `self` to `to`.
    ///
    /// An axis missing on either side contributes zero.
    pub fn displacement_2d(&self, to: &Self) -> Vec2 {
        Vec2::new(axis_delta(self.x, to.x), axis_delta(self.y, to.y))
    }

    /// XYZ displacement from `self` to `to`.
    ///
    /// An axis missing on either side contributes zero.
    pub fn displacement_3d(&self, to: &Self) -> Vec3 {
        Vec3::new(
            axis_delta(self.x, to.x),
            axis_delta(self.y, to.y),
            axis_delta(self.z, to.z),
        )
    }

    /// Planar distance from `self` to `to`.
    pub fn distance(&self, to: &Self) -> f64 {
        self.displacement_2d(to).norm()
    }
}

impl fmt::Display for MotionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(LINEAR_MOVE)?;
        let words = [
            ('X', self.x),
            ('Y', self.y),
            ('Z', self.z),
            ('E', self.e),
            ('F', self.f),
        ];
        for (key, value) in words {
            if let Some(value) = value {
                write!(f, " {}{}", key, format_value(value))?;
            }
        }
        if let Some(comment) = &self.comment {
            write!(f, " {}{}", COMMENT_MARKER, comment)?;
        }
        Ok(())
    }
}

/// Sum of consecutive planar distances along `records`.
pub fn path_length(records: &[MotionRecord]) -> f64 {
    records.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

fn axis_delta(from: Option<f64>, to: Option<f64>) -> f64 {
    match (from, to) {
        (Some(a), Some(b)) => b - a,
        _ => 0.0,
    }
}

/// Split a word such as `X-.5` into its key and value.
fn parse_word(word: &str) -> Option<(char, f64)> {
    let mut chars = word.chars();
    let key = chars.next()?;
    if !matches!(key, 'X' | 'Y' | 'Z' | 'E' | 'F') {
        return None;
    }
    let value: f64 = chars.as_str().parse().ok()?;
    value.is_finite().then_some((key, value))
}

/// Format with up to five fractional digits, trailing zeros trimmed.
fn format_value(value: f64) -> String {
    let mut s = format!("{:.prec$}", value, prec = PRECISION);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s.remove(0);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_fields() {
        let r = MotionRecord::parse("G1 X10.5 Y-3 Z0.2 E.0421 F1800", 7).unwrap();
        assert_eq!(r.origin, Origin::Line(7));
        assert_eq!(r.x, Some(10.5));
        assert_eq!(r.y, Some(-3.0));
        assert_eq!(r.z, Some(0.2));
        assert_eq!(r.e, Some(0.0421));
        assert_eq!(r.f, Some(1800.0));
        assert!(r.comment.is_none());
        assert!(r.is_spatial());
    }

    #[test]
    fn test_parse_rejects_other_commands() {
        assert!(MotionRecord::parse("G0 X1 Y1", 0).is_none());
        assert!(MotionRecord::parse("G10", 0).is_none());
        assert!(MotionRecord::parse(";G1 X1", 0).is_none());
        assert!(MotionRecord::parse("", 0).is_none());
        assert!(MotionRecord::parse("M104 S200", 0).is_none());
    }

    #[test]
    fn test_parse_sign_dot_form() {
        let r = MotionRecord::parse("G1 X-.5 Y+.25", 0).unwrap();
        assert_eq!(r.x, Some(-0.5));
        assert_eq!(r.y, Some(0.25));
    }

    #[test]
    fn test_last_repeated_key_wins() {
        let r = MotionRecord::parse("G1 X1 X2 Y3", 0).unwrap();
        assert_eq!(r.x, Some(2.0));
    }

    #[test]
    fn test_malformed_word_skipped() {
        let r = MotionRecord::parse("G1 Xabc Y2 E1..2 Q5", 0).unwrap();
        assert_eq!(r.x, None);
        assert_eq!(r.y, Some(2.0));
        assert_eq!(r.e, None);
    }

    #[test]
    fn test_comment_verbatim() {
        let r = MotionRecord::parse("G1 X1 Y2 ; wipe X9 ; again", 0).unwrap();
        assert_eq!(r.x, Some(1.0));
        assert_eq!(r.comment.as_deref(), Some(" wipe X9 ; again"));
        assert_eq!(r.to_string(), "G1 X1 Y2 ; wipe X9 ; again");
    }

    #[test]
    fn test_opcode_must_stand_alone() {
        assert!(MotionRecord::parse("G1;note", 0).is_none());
        assert!(MotionRecord::parse("G1X1 Y1", 0).is_none());
    }

    #[test]
    fn test_comment_starts_at_marker_word() {
        let r = MotionRecord::parse("G1 X1 Y2;note", 0).unwrap();
        assert_eq!(r.x, Some(1.0));
        assert_eq!(r.y, None);
        assert_eq!(r.comment, None);

        let r = MotionRecord::parse("G1 X1 ;note Y2", 0).unwrap();
        assert_eq!(r.y, None);
        assert_eq!(r.comment.as_deref(), Some("note Y2"));
    }

    #[test]
    fn test_serialize_order_and_precision() {
        let r = MotionRecord {
            f: Some(1200.0),
            e: Some(0.123456789),
            y: Some(2.5),
            x: Some(-0.000001),
            ..MotionRecord::synthesized()
        };
        assert_eq!(r.to_string(), "G1 X0 Y2.5 E0.12346 F1200");
    }

    #[test]
    fn test_round_trip() {
        let lines = [
            "G1 X120.512 Y98.07 E.03211",
            "G1 Z.6 F720",
            "G1 X1 Y2 Z3 E4 F5 ;comment",
            "G1 F4200 ; travel",
        ];
        for line in lines {
            let r = MotionRecord::parse(line, 0).unwrap();
            let again = MotionRecord::parse(&r.to_string(), 0).unwrap();
            assert_eq!(r, again, "round trip of {line}");
        }
    }

    #[test]
    fn test_displacement_missing_axis() {
        let a = MotionRecord::parse("G1 X1 Y1 Z1", 0).unwrap();
        let b = MotionRecord::parse("G1 X4 Z3", 1).unwrap();
        let d = a.displacement_3d(&b);
        assert_relative_eq!(d, Vec3::new(3.0, 0.0, 2.0));
        assert_relative_eq!(a.distance(&b), 3.0);
    }

    #[test]
    fn test_path_length() {
        let records: Vec<_> = ["G1 X0 Y0", "G1 X3 Y4", "G1 X3 Y0"]
            .iter()
            .enumerate()
            .filter_map(|(i, l)| MotionRecord::parse(l, i))
            .collect();
        assert_relative_eq!(path_length(&records), 9.0);
        assert_eq!(path_length(&records[..1]), 0.0);
    }
}
