//! Post-processing parameters.

use serde::{Deserialize, Serialize};
use spiral_gcode::Markers;

use crate::error::{PostError, Result};

/// Parameters for bridging consecutive single-extrusion layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectSettings {
    /// Extrusion values are per move (`M83`) rather than cumulative.
    pub relative_extrusion: bool,
    /// Longest bridge that will be added (mm).
    pub max_distance: f64,
    /// Bridges shorter than this are skipped as already coincident (mm).
    pub min_distance: f64,
    /// Scale applied to the extrusion rate of the final segment.
    pub feed_multiplier: f64,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            relative_extrusion: true,
            max_distance: 2.0,
            min_distance: 0.0001,
            feed_multiplier: 0.8,
        }
    }
}

/// Parameters for vase-mode Z interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaseSettings {
    /// Layers at each end of a run over which the ramp reaches full height.
    pub transition_layers: u32,
    /// Bridge eligible layers before interpolating.
    pub connect_first: bool,
}

impl Default for VaseSettings {
    fn default() -> Self {
        Self {
            transition_layers: 4,
            connect_first: false,
        }
    }
}

/// Parameters for seam alignment between consecutive spiral layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignSettings {
    /// Strength of the direction blend at the very end of the layer (0 to 1).
    pub intensity: f64,
    /// Minimum cosine similarity between tail and head directions.
    pub threshold: f64,
    /// Fraction of the layer path reshaped at its tail.
    pub length_ratio: f64,
    /// Cap on the reshaped tail length (mm).
    pub max_length: f64,
    /// Fraction of each path sampled to measure its direction.
    pub sample_ratio: f64,
    /// Cap on the sampled length (mm).
    pub max_sample_length: f64,
    /// Exponent applied to the ramp weight of the seam offset.
    pub offset_power: f64,
}

impl Default for AlignSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            threshold: 0.9,
            length_ratio: 0.2,
            max_length: 5.0,
            sample_ratio: 0.05,
            max_sample_length: 1.0,
            offset_power: 1.0,
        }
    }
}

impl AlignSettings {
    /// Length of the reshaped tail for a path of `total` mm.
    pub fn budget(&self, total: f64) -> f64 {
        (total * self.length_ratio).min(self.max_length)
    }

    /// Length sampled to measure direction for a path of `total` mm.
    pub fn sample_length(&self, total: f64) -> f64 {
        (total * self.sample_ratio).min(self.max_sample_length)
    }
}

/// All post-processing parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSettings {
    /// Layer bridging.
    pub connect: ConnectSettings,
    /// Vase interpolation.
    pub vase: VaseSettings,
    /// Seam alignment.
    pub align: AlignSettings,
    /// Slicer comment markers.
    pub markers: Markers,
}

impl PostSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let c = &self.connect;
        if !(c.max_distance > 0.0) {
            return Err(PostError::InvalidSettings(
                "connect.max_distance must be positive".into(),
            ));
        }
        if !(c.min_distance >= 0.0) || c.min_distance >= c.max_distance {
            return Err(PostError::InvalidSettings(
                "connect.min_distance must be between 0 and max_distance".into(),
            ));
        }
        if !(c.feed_multiplier >= 0.0) {
            return Err(PostError::InvalidSettings(
                "connect.feed_multiplier must not be negative".into(),
            ));
        }

        let a = &self.align;
        if !(0.0..=1.0).contains(&a.intensity) {
            return Err(PostError::InvalidSettings(
                "align.intensity must be between 0 and 1".into(),
            ));
        }
        if !(a.threshold > 0.0 && a.threshold <= 1.0) {
            return Err(PostError::InvalidSettings(
                "align.threshold must be in (0, 1]".into(),
            ));
        }
        if !(a.length_ratio > 0.0 && a.length_ratio <= 1.0)
            || !(a.sample_ratio > 0.0 && a.sample_ratio <= 1.0)
        {
            return Err(PostError::InvalidSettings(
                "align ratios must be in (0, 1]".into(),
            ));
        }
        if !(a.max_length > 0.0) || !(a.max_sample_length > 0.0) {
            return Err(PostError::InvalidSettings(
                "align length caps must be positive".into(),
            ));
        }
        if !(a.offset_power > 0.0) {
            return Err(PostError::InvalidSettings(
                "align.offset_power must be positive".into(),
            ));
        }

        if self.markers.layer_change.is_empty() {
            return Err(PostError::InvalidSettings(
                "markers.layer_change must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_valid() {
        PostSettings::default().validate().unwrap();
    }

    #[test]
    fn test_invalid_settings() {
        let mut settings = PostSettings::default();
        settings.connect.max_distance = -1.0;
        assert!(settings.validate().is_err());

        let mut settings = PostSettings::default();
        settings.align.threshold = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = PostSettings::default();
        settings.align.offset_power = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_budget_capped() {
        let align = AlignSettings::default();
        assert_relative_eq!(align.budget(10.0), 2.0);
        assert_relative_eq!(align.budget(100.0), 5.0);
        assert_relative_eq!(align.sample_length(10.0), 0.5);
        assert_relative_eq!(align.sample_length(100.0), 1.0);
    }
}
