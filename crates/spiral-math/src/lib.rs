#![warn(missing_docs)]

//! Math types for the spiral post-processor.
//!
//! Thin wrappers around nalgebra providing the planar and spatial vector
//! types used when measuring and reshaping printer toolpaths, plus the
//! tolerance used to decide when a length is effectively zero.

use nalgebra::{Vector2, Vector3};

/// A point on the build plate (XY, mm).
pub type Point2 = nalgebra::Point2<f64>;

/// A planar displacement (XY, mm).
pub type Vec2 = Vector2<f64>;

/// A spatial displacement (XYZ, mm).
pub type Vec3 = Vector3<f64>;

/// Tolerance constants for toolpath comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Lengths below this are treated as zero (mm).
    pub linear: f64,
}

impl Tolerance {
    /// Default toolpath tolerance (1e-9 mm).
    pub const DEFAULT: Self = Self { linear: 1e-9 };

    /// Check if a scalar length is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Normalize `v`, or `None` if it is too short to have a direction.
    pub fn direction(&self, v: &Vec2) -> Option<Vec2> {
        v.try_normalize(self.linear)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Sum of consecutive distances along an ordered point sequence.
pub fn path_length(points: &[Point2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Normalized dot product of `a` and `b`, clamped to `[-1, 1]`.
///
/// Returns `None` when either vector is degenerate.
pub fn cosine_similarity(a: &Vec2, b: &Vec2) -> Option<f64> {
    let tol = Tolerance::DEFAULT;
    let na = a.norm();
    let nb = b.norm();
    if tol.is_zero(na) || tol.is_zero(nb) {
        return None;
    }
    Some((a.dot(b) / (na * nb)).clamp(-1.0, 1.0))
}

/// Component of `v` along the unit vector `dir`.
pub fn project_onto(v: &Vec2, dir: &Vec2) -> Vec2 {
    dir * v.dot(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_path_length() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 4.0),
            Point2::new(3.0, 10.0),
        ];
        assert_relative_eq!(path_length(&pts), 11.0);
        assert_eq!(path_length(&pts[..1]), 0.0);
        assert_eq!(path_length(&[]), 0.0);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = Vec2::new(2.0, 0.0);
        assert_relative_eq!(cosine_similarity(&a, &Vec2::new(5.0, 0.0)).unwrap(), 1.0);
        assert_relative_eq!(cosine_similarity(&a, &Vec2::new(-1.0, 0.0)).unwrap(), -1.0);
        assert_relative_eq!(cosine_similarity(&a, &Vec2::new(0.0, 3.0)).unwrap(), 0.0);
        assert!(cosine_similarity(&a, &Vec2::zeros()).is_none());
    }

    #[test]
    fn test_project_onto() {
        let v = Vec2::new(3.0, 4.0);
        let p = project_onto(&v, &Vec2::x());
        assert_relative_eq!(p, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_direction() {
        let tol = Tolerance::DEFAULT;
        assert!(tol.direction(&Vec2::new(1e-12, 0.0)).is_none());
        assert_relative_eq!(tol.direction(&Vec2::new(0.0, 2.0)).unwrap(), Vec2::y());
    }
}
