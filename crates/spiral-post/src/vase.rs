//! Vase-mode Z interpolation.
//!
//! Runs of consecutive single-extrusion layers are turned into a spiral
//! by raising every move in a layer linearly with the distance travelled,
//! so each layer ends where the next one starts. The rise ramps in and
//! out over a number of transition layers at both ends of a run.

use std::fmt;
use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use spiral_gcode::{path_length, Layer};
use spiral_math::Tolerance;

use crate::connect::connect_layers;
use crate::error::Result;
use crate::seam::align_layer;
use crate::settings::{AlignSettings, PostSettings};

/// Counters for one transformed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Layers in the run.
    pub layers: usize,
    /// Records given an interpolated Z.
    pub rewritten: usize,
    /// Seams aligned.
    pub aligned: usize,
    /// Seams left alone.
    pub align_skipped: usize,
}

/// Counters for a whole vase pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaseReport {
    /// Bridges added before interpolating, if connection was requested.
    pub connected: Option<usize>,
    /// Eligible runs found.
    pub runs: usize,
    /// Layers in all transformed runs.
    pub layers: usize,
    /// Records given an interpolated Z.
    pub rewritten: usize,
    /// Seams aligned.
    pub aligned: usize,
    /// Seams left alone.
    pub align_skipped: usize,
}

impl VaseReport {
    fn add(&mut self, run: &RunReport) {
        self.runs += 1;
        self.layers += run.layers;
        self.rewritten += run.rewritten;
        self.aligned += run.aligned;
        self.align_skipped += run.align_skipped;
    }
}

impl fmt::Display for VaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(connected) = self.connected {
            write!(f, "connected {} layers, ", connected)?;
        }
        write!(
            f,
            "vased {} layers in {} runs ({} moves rewritten)",
            self.layers, self.runs, self.rewritten
        )?;
        if self.aligned + self.align_skipped > 0 {
            write!(
                f,
                ", aligned {} seams ({} skipped)",
                self.aligned, self.align_skipped
            )?;
        }
        Ok(())
    }
}

/// Ramp weight of the layer at `position` in a run of `run_len` layers.
///
/// Zero at both ends of the run, rising by `1 / transition_layers` per
/// layer to a plateau of one.
pub fn layer_weight(position: usize, run_len: usize, transition_layers: u32) -> f64 {
    if transition_layers == 0 {
        return 1.0;
    }
    let edge = position.min(run_len.saturating_sub(position + 1));
    (edge as f64 / transition_layers as f64).clamp(0.0, 1.0)
}

/// Maximal runs of single-extrusion layers long enough for a ramp.
///
/// A run is kept only if it has more than `2 * transition_layers` layers.
pub fn find_eligible_runs(layers: &[Layer], transition_layers: u32) -> Vec<Range<usize>> {
    let min_len = 2 * transition_layers as usize;
    let mut runs = Vec::new();
    let mut start = None;

    for (i, layer) in layers.iter().enumerate() {
        match (layer.is_single_extrusion(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..layers.len());
    }

    runs.retain(|run| run.len() > min_len);
    for run in &runs {
        tracing::info!(
            start = run.start,
            end = run.end - 1,
            z_start = layers[run.start].z(),
            z_end = layers[run.end - 1].z(),
            "found layers to vase"
        );
    }
    runs
}

/// Raise the moves of `layer` along its path by up to `weight` layer heights.
///
/// Moves that already carry a Z are left as the slicer wrote them.
/// Returns the number of moves rewritten; a layer with no path length is
/// left untouched.
pub fn vase_layer(layer: &mut Layer, weight: f64) -> Result<usize> {
    let records = layer.planar_records();
    let total = path_length(&records);
    if Tolerance::DEFAULT.is_zero(total) {
        return Ok(0);
    }

    let base = layer.z();
    let rise = layer.height() * weight;
    let mut travelled = 0.0;
    let mut rewritten = 0;
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            travelled += records[i - 1].distance(record);
        }
        if record.z.is_some() {
            continue;
        }
        let mut raised = record.clone();
        raised.z = Some(base + rise * (travelled / total));
        layer.rewrite(&raised)?;
        rewritten += 1;
    }
    Ok(rewritten)
}

/// Interpolate Z across one run, optionally aligning each seam to the next layer.
pub fn transform_run(
    run: &mut [Layer],
    transition_layers: u32,
    align: Option<&AlignSettings>,
) -> Result<RunReport> {
    let n = run.len();
    let mut report = RunReport {
        layers: n,
        ..Default::default()
    };

    for i in 0..n {
        let weight = layer_weight(i, n, transition_layers);
        report.rewritten += vase_layer(&mut run[i], weight)?;

        if let Some(settings) = align {
            if i + 1 < n {
                let (current, rest) = run.split_at_mut(i + 1);
                if align_layer(&mut current[i], &rest[0], settings)?.is_aligned() {
                    report.aligned += 1;
                } else {
                    report.align_skipped += 1;
                }
            }
        }
    }
    Ok(report)
}

/// Find every eligible run in `layers` and transform it.
///
/// Runs are disjoint, so they are transformed in parallel.
pub fn vase_layers(
    layers: &mut [Layer],
    settings: &PostSettings,
    align: bool,
) -> Result<VaseReport> {
    let transition_layers = settings.vase.transition_layers;
    let mut report = VaseReport::default();

    if settings.vase.connect_first {
        let connected = connect_layers(layers, &settings.connect)?;
        report.connected = Some(connected);
        if connected < 2 * transition_layers as usize {
            tracing::info!(
                connected,
                transition_layers,
                "too few connected layers for a vase transition"
            );
            return Ok(report);
        }
    }

    let runs = find_eligible_runs(layers, transition_layers);
    let align = align.then_some(&settings.align);
    let results = split_runs(layers, &runs)
        .into_par_iter()
        .map(|run| transform_run(run, transition_layers, align))
        .collect::<Result<Vec<_>>>()?;

    for run in &results {
        report.add(run);
    }
    tracing::info!(%report, "vase pass complete");
    Ok(report)
}

/// Borrow each of the sorted, disjoint `runs` as its own mutable slice.
fn split_runs<'a>(mut layers: &'a mut [Layer], runs: &[Range<usize>]) -> Vec<&'a mut [Layer]> {
    let mut slices = Vec::with_capacity(runs.len());
    let mut consumed = 0;
    for run in runs {
        let (_, rest) = std::mem::take(&mut layers).split_at_mut(run.start - consumed);
        let (slice, rest) = rest.split_at_mut(run.len());
        slices.push(slice);
        layers = rest;
        consumed = run.end;
    }
    slices
}
