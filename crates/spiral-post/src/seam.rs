//! Seam alignment between consecutive spiral layers.
//!
//! The tail of a layer is bent so that its direction follows the head of
//! the next layer, and its end point lands on the next layer's start.
//! The reshaping fades out over a budgeted length measured back from the
//! end of the layer.

use spiral_gcode::{path_length, Layer, MotionRecord};
use spiral_math::{cosine_similarity, project_onto, Point2, Tolerance, Vec2};

use crate::error::Result;
use crate::settings::AlignSettings;

/// Result of trying to align a layer to the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignOutcome {
    /// The tail was reshaped.
    Aligned {
        /// Cosine similarity of tail and head directions.
        similarity: f64,
        /// Seam offset applied in full to the last point.
        offset: Vec2,
        /// Number of records rewritten.
        adjusted: usize,
    },
    /// Either layer has fewer than two planar moves.
    TooFewPoints,
    /// Either path has no measurable length or direction.
    DegeneratePath,
    /// The directions differ too much to align safely.
    Dissimilar(f64),
}

impl AlignOutcome {
    /// Was the layer reshaped?
    pub fn is_aligned(&self) -> bool {
        matches!(self, AlignOutcome::Aligned { .. })
    }
}

/// Reshape the tail of `layer` to meet the head of `reference`.
///
/// Only X and Y of `layer` are rewritten; `reference` is read only.
pub fn align_layer(
    layer: &mut Layer,
    reference: &Layer,
    settings: &AlignSettings,
) -> Result<AlignOutcome> {
    let tol = Tolerance::DEFAULT;
    let mut records = layer.planar_records();
    let ref_records = reference.planar_records();
    if records.len() < 2 || ref_records.len() < 2 {
        return Ok(AlignOutcome::TooFewPoints);
    }
    let Some(points) = records
        .iter()
        .map(MotionRecord::point)
        .collect::<Option<Vec<Point2>>>()
    else {
        return Ok(AlignOutcome::TooFewPoints);
    };
    let Some(ref_start) = ref_records[0].point() else {
        return Ok(AlignOutcome::TooFewPoints);
    };

    let total = spiral_math::path_length(&points);
    let ref_total = path_length(&ref_records);
    if tol.is_zero(total) || tol.is_zero(ref_total) {
        return Ok(AlignOutcome::DegeneratePath);
    }

    // The tail is walked backwards, so its summed displacement points backwards too.
    let final_vector = -sample_vector(records.iter().rev(), settings.sample_length(total));
    let ref_vector = sample_vector(ref_records.iter(), settings.sample_length(ref_total));
    let (Some(final_dir), Some(ref_dir), Some(similarity)) = (
        tol.direction(&final_vector),
        tol.direction(&ref_vector),
        cosine_similarity(&final_vector, &ref_vector),
    ) else {
        return Ok(AlignOutcome::DegeneratePath);
    };

    if similarity <= 0.0 || similarity < settings.threshold {
        tracing::debug!(
            z = layer.z(),
            next_z = reference.z(),
            similarity,
            "skipped alignment: directions differ"
        );
        return Ok(AlignOutcome::Dissimilar(similarity));
    }

    let n = points.len();
    let end = points[n - 1];
    let gap = ref_start - end;
    let offset = gap - project_onto(&gap, &final_dir) * similarity;

    let mut adjusted = 0;
    records[n - 1].set_point(end + offset);
    layer.rewrite(&records[n - 1])?;
    adjusted += 1;

    let budget = settings.budget(total);
    let mut remaining = budget;
    // Reshaped position of the current segment's end, before the offset.
    let mut chain = end;
    let mut index = n - 1;
    while remaining > 0.0 && index > 0 {
        let segment = points[index] - points[index - 1];
        let length = segment.norm();

        let mut weight = settings.intensity * remaining / budget;
        if length > remaining {
            weight *= remaining / length;
        }
        let direction = tol
            .direction(&segment)
            .map(|dir| tol.direction(&dir.lerp(&ref_dir, weight)).unwrap_or(dir))
            .unwrap_or(ref_dir);

        remaining -= length.min(remaining);
        let from = chain - direction * length;
        let offset_weight = (remaining / budget).powf(settings.offset_power);
        let moved = from + offset * offset_weight;

        if moved != points[index - 1] {
            records[index - 1].set_point(moved);
            layer.rewrite(&records[index - 1])?;
            adjusted += 1;
        }
        chain = from;
        index -= 1;
    }

    tracing::debug!(
        z = layer.z(),
        next_z = reference.z(),
        similarity,
        offset_x = offset.x,
        offset_y = offset.y,
        adjusted,
        "aligned seam"
    );
    Ok(AlignOutcome::Aligned {
        similarity,
        offset,
        adjusted,
    })
}

/// Sum consecutive displacements until `length` mm have been covered.
fn sample_vector<'a>(records: impl Iterator<Item = &'a MotionRecord>, length: f64) -> Vec2 {
    let mut sum = Vec2::zeros();
    let mut sampled = 0.0;
    let mut prev: Option<&MotionRecord> = None;
    for record in records {
        if let Some(prev) = prev {
            let step = prev.displacement_2d(record);
            sum += step;
            sampled += step.norm();
            if sampled >= length {
                break;
            }
        }
        prev = Some(record);
    }
    sum
}
