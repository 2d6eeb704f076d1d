//! Bridging between consecutive single-extrusion layers.
//!
//! When two neighbouring layers are each printed as one continuous
//! extrusion, the travel from the end of one to the start of the next
//! leaves a gap. A bridge is an extra extruding move appended to the
//! lower layer that ends exactly where the upper layer begins.

use spiral_gcode::{Layer, MotionRecord};

use crate::error::Result;
use crate::settings::ConnectSettings;

const BRIDGE_COMMENT: &str = " connect to next layer";

/// Result of trying to bridge two layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectOutcome {
    /// A bridging move was appended.
    Connected {
        /// Bridge length (mm).
        distance: f64,
        /// Extrusion per mm used for the bridge.
        rate: f64,
    },
    /// One of the layers is not single extrusion.
    NotEligible,
    /// The lower layer has fewer than two planar moves, or the upper none.
    TooFewPoints,
    /// The final segment of the lower layer has no length or no usable extrusion.
    DegenerateSegment,
    /// The gap is longer than the configured maximum (mm).
    TooFar(f64),
    /// The layers already meet (mm).
    Coincident(f64),
}

impl ConnectOutcome {
    /// Was a bridge appended?
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected { .. })
    }
}

/// Append a bridge from the end of `a` to the start of `b`.
///
/// The bridge extrudes at the rate of `a`'s final segment, scaled by the
/// feed multiplier. `b` is never modified.
pub fn connect(a: &mut Layer, b: &Layer, settings: &ConnectSettings) -> Result<ConnectOutcome> {
    if !a.is_single_extrusion() || !b.is_single_extrusion() {
        return Ok(ConnectOutcome::NotEligible);
    }

    let a_records = a.planar_records();
    let first = b.planar_records().into_iter().next();
    let (Some(target), [.., prev, last]) = (first, a_records.as_slice()) else {
        return Ok(ConnectOutcome::TooFewPoints);
    };

    let segment = prev.distance(last);
    let Some(rate) = extrusion_rate(prev, last, segment, settings) else {
        return Ok(ConnectOutcome::DegenerateSegment);
    };

    let distance = last.distance(&target);
    if distance > settings.max_distance {
        tracing::debug!(
            z = a.z(),
            next_z = b.z(),
            distance,
            "skipped connection: too far"
        );
        return Ok(ConnectOutcome::TooFar(distance));
    }
    if distance < settings.min_distance {
        tracing::debug!(
            z = a.z(),
            next_z = b.z(),
            distance,
            "skipped connection: already coincident"
        );
        return Ok(ConnectOutcome::Coincident(distance));
    }

    // Only reachable with E present on `last`: single extrusion guarantees it.
    let last_e = last.e.unwrap_or_default();
    let extrusion = if settings.relative_extrusion {
        rate * distance
    } else {
        last_e + rate * distance
    };
    let bridge = MotionRecord {
        x: target.x,
        y: target.y,
        z: target.z,
        e: Some(extrusion),
        f: last.f,
        comment: Some(BRIDGE_COMMENT.to_string()),
        ..MotionRecord::synthesized()
    };
    a.rewrite(&bridge)?;

    tracing::debug!(
        z = a.z(),
        next_z = b.z(),
        distance,
        rate,
        bridge = %bridge,
        "connected layers"
    );
    Ok(ConnectOutcome::Connected { distance, rate })
}

/// Bridge every adjacent pair of layers, returning how many were bridged.
pub fn connect_layers(layers: &mut [Layer], settings: &ConnectSettings) -> Result<usize> {
    let mut count = 0;
    for i in 0..layers.len().saturating_sub(1) {
        let (lower, upper) = layers.split_at_mut(i + 1);
        if connect(&mut lower[i], &upper[0], settings)?.is_connected() {
            count += 1;
        }
    }
    tracing::info!(count, layers = layers.len(), "connected single-extrusion layers");
    Ok(count)
}

/// Extrusion per mm along the segment `prev -> last`.
fn extrusion_rate(
    prev: &MotionRecord,
    last: &MotionRecord,
    segment: f64,
    settings: &ConnectSettings,
) -> Option<f64> {
    if !(segment >= settings.min_distance) {
        return None;
    }
    let e = if settings.relative_extrusion {
        last.e?
    } else {
        prev.e? - last.e?
    };
    Some(e / segment * settings.feed_multiplier)
}
