//! Whole-program model: intro, layers, outro.

use crate::error::{GcodeError, Result};
use crate::flavor::Markers;
use crate::layer::{Layer, LayerInfo};

/// A G-code program split into an intro block, layers and an outro block.
///
/// Concatenating the three parts in order always yields the full program.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    intro: Vec<String>,
    layers: Vec<Layer>,
    outro: Vec<String>,
}

impl Document {
    /// Split program lines at the layer change and end-of-block markers.
    ///
    /// Everything before the first layer change marker is the intro.
    /// Everything from the end-of-block marker (searched from the first
    /// layer on) is the outro. Each layer change marker line starts a new
    /// layer.
    pub fn split<S: AsRef<str>>(lines: &[S], markers: &Markers) -> Result<Self> {
        let first = lines
            .iter()
            .position(|l| markers.is_layer_change(l.as_ref()))
            .ok_or_else(|| GcodeError::NoLayerMarkers(markers.layer_change.clone()))?;

        let end = lines[first..]
            .iter()
            .position(|l| markers.is_end_of_block(l.as_ref()))
            .map_or(lines.len(), |i| first + i);

        let mut layers = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for line in &lines[first..end] {
            let line = line.as_ref();
            if markers.is_layer_change(line) && !current.is_empty() {
                layers.push(Layer::new(std::mem::take(&mut current), markers));
            }
            current.push(line.to_string());
        }
        if !current.is_empty() {
            layers.push(Layer::new(current, markers));
        }

        tracing::debug!(
            intro = first,
            layers = layers.len(),
            outro = lines.len() - end,
            "split document"
        );

        Ok(Self {
            intro: owned(&lines[..first]),
            layers,
            outro: owned(&lines[end..]),
        })
    }

    /// Split program text. Line terminators are not retained.
    pub fn parse(text: &str, markers: &Markers) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        Self::split(&lines, markers)
    }

    /// A document with no layers: every line is intro.
    pub fn unlayered<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            intro: owned(lines),
            layers: Vec::new(),
            outro: Vec::new(),
        }
    }

    /// Lines before the first layer.
    pub fn intro(&self) -> &[String] {
        &self.intro
    }

    /// Layers in print order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers in print order, for transforms.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Lines from the end-of-block marker on.
    pub fn outro(&self) -> &[String] {
        &self.outro
    }

    /// Total number of lines across all parts.
    pub fn line_count(&self) -> usize {
        self.intro.len()
            + self.layers.iter().map(|l| l.lines().len()).sum::<usize>()
            + self.outro.len()
    }

    /// Concatenate intro, every layer's current lines, and outro.
    pub fn reassemble(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.line_count());
        lines.extend_from_slice(&self.intro);
        for layer in &self.layers {
            lines.extend_from_slice(layer.lines());
        }
        lines.extend_from_slice(&self.outro);
        lines
    }

    /// Statistics for every layer.
    pub fn layer_infos(&self) -> Vec<LayerInfo> {
        self.layers.iter().map(Layer::info).collect()
    }

    /// Human-readable per-layer statistics, one layer per line.
    pub fn summary(&self) -> String {
        self.layer_infos()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn owned<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines.iter().map(|l| l.as_ref().to_string()).collect()
}
