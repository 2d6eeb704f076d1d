//! Settings assembly: TOML file first, then command-line overrides.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use spiral_gcode::SlicerFlavor;
use spiral_post::PostSettings;

/// Flags that feed into [`PostSettings`].
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// TOML file with post-processing settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Slicer that produced the file (orca, prusa)
    #[arg(long)]
    pub flavor: Option<SlicerFlavor>,

    /// Layers at each end of a vase run over which the ramp builds up
    #[arg(long, value_name = "N")]
    pub transition_layers: Option<u32>,

    /// Longest bridge between layers (mm)
    #[arg(long, value_name = "MM")]
    pub max_distance: Option<f64>,

    /// Extrusion values are cumulative (M82) instead of relative
    #[arg(long)]
    pub absolute_extrusion: bool,
}

impl SettingsArgs {
    /// Load the config file, if any, and apply the flag overrides.
    pub fn load(&self) -> Result<PostSettings> {
        let settings = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                parse_settings(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => PostSettings::default(),
        };
        Ok(self.apply(settings))
    }

    fn apply(&self, mut settings: PostSettings) -> PostSettings {
        if let Some(flavor) = self.flavor {
            settings.markers = flavor.markers();
        }
        if let Some(n) = self.transition_layers {
            settings.vase.transition_layers = n;
        }
        if let Some(d) = self.max_distance {
            settings.connect.max_distance = d;
        }
        if self.absolute_extrusion {
            settings.connect.relative_extrusion = false;
        }
        settings
    }
}

fn parse_settings(text: &str) -> Result<PostSettings> {
    let settings: PostSettings = toml::from_str(text)?;
    settings.validate()?;
    Ok(settings)
}
