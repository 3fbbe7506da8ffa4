//! Visualizer configuration.
//!
//! All timing values are in virtual time units; the host decides how a unit
//! maps to wall-clock time when it drives the timeline.
//!
//! # Example
//!
//! ```
//! use weightscope::{OutputLayerPolicy, VisualizerConfig};
//!
//! let json = r#"{ "frame_interval": 2.0, "output_layer_policy": "exclude" }"#;
//! let config = VisualizerConfig::from_json(json).unwrap();
//! assert_eq!(config.frame_interval, 2.0);
//! assert_eq!(config.output_layer_policy, OutputLayerPolicy::Exclude);
//! assert_eq!(config.transition_duration, 1.0);
//! ```

use crate::layout::Viewport;
use crate::{Result, VizError};
use serde::{Deserialize, Serialize};

/// Whether weight changes on the output layer take part in the animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayerPolicy {
    /// Diff the output layer like any hidden layer
    #[default]
    Include,
    /// Skip the output layer; its incoming edges are not drawn
    Exclude,
}

/// Tunables for a visualization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Delay between consecutive epoch frames
    pub frame_interval: f64,
    /// Duration of enter/exit transitions; shorter than `frame_interval`
    pub transition_duration: f64,
    pub output_layer_policy: OutputLayerPolicy,
    /// Radius of every drawn node
    pub node_radius: f64,
    /// Initial drawing area, until the renderer reports its own
    pub viewport: Viewport,
    /// Directory the fetch collaborator resolves filenames against
    pub asset_base_path: String,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            frame_interval: 1.5,
            transition_duration: 1.0,
            output_layer_policy: OutputLayerPolicy::Include,
            node_radius: 5.0,
            viewport: Viewport::default(),
            asset_base_path: "assets/".to_string(),
        }
    }
}

impl VisualizerConfig {
    /// Check the invariants between fields.
    pub fn validate(&self) -> Result<()> {
        if !(self.frame_interval.is_finite() && self.frame_interval > 0.0) {
            return Err(VizError::InvalidParameter(format!(
                "frame_interval must be positive, got {}",
                self.frame_interval
            )));
        }
        if !(self.transition_duration.is_finite() && self.transition_duration > 0.0) {
            return Err(VizError::InvalidParameter(format!(
                "transition_duration must be positive, got {}",
                self.transition_duration
            )));
        }
        if self.transition_duration >= self.frame_interval {
            return Err(VizError::InvalidParameter(format!(
                "transition_duration ({}) must be shorter than frame_interval ({})",
                self.transition_duration, self.frame_interval
            )));
        }
        if !(self.node_radius.is_finite() && self.node_radius > 0.0) {
            return Err(VizError::InvalidParameter(format!(
                "node_radius must be positive, got {}",
                self.node_radius
            )));
        }
        self.viewport.validate()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_file(&self, path: &str) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
