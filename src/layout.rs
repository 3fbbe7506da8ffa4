//! Node placement rules.
//!
//! Layers are spread horizontally with a common `layer_spacing` of
//! `width / (layers + 1)`. Units are spread vertically with a spacing of
//! `height / layer_size`, computed per layer, so every layer fills the full
//! height regardless of its size. Each element sits in the middle of its slot.

use crate::{Result, Topology, VizError};
use serde::{Deserialize, Serialize};

/// Size of the drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        let viewport = Self { width, height };
        viewport.validate()?;
        Ok(viewport)
    }

    pub fn validate(&self) -> Result<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(VizError::InvalidParameter(format!(
                "viewport must be positive, got {}x{}",
                self.width, self.height
            )))
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
        }
    }
}

/// Screen placement of a topology inside a viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    viewport: Viewport,
    layer_spacing: f64,
    unit_spacings: Vec<f64>,
}

impl Layout {
    pub fn new(topology: &Topology, viewport: Viewport) -> Self {
        let layer_spacing = viewport.width / (topology.num_layers() + 1) as f64;
        let unit_spacings = topology
            .layers()
            .iter()
            .map(|&size| viewport.height / size as f64)
            .collect();

        Self {
            viewport,
            layer_spacing,
            unit_spacings,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn layer_spacing(&self) -> f64 {
        self.layer_spacing
    }

    /// Vertical spacing of units in `layer`.
    pub fn unit_spacing(&self, layer: usize) -> Option<f64> {
        self.unit_spacings.get(layer).copied()
    }

    #[inline]
    pub fn node_x(&self, layer: usize) -> f64 {
        self.layer_spacing * layer as f64 + self.layer_spacing / 2.0
    }

    /// Vertical position of `unit` in `layer`, if the layer exists.
    #[inline]
    pub fn node_y(&self, layer: usize, unit: usize) -> Option<f64> {
        self.unit_spacing(layer).map(|s| unit_y(s, unit))
    }
}

/// Vertical position of `unit` given its layer's spacing.
#[inline]
pub fn unit_y(unit_spacing: f64, unit: usize) -> f64 {
    unit_spacing * unit as f64 + unit_spacing / 2.0
}
