//! Builds one renderable [`Frame`] per epoch.
//!
//! Nodes come from the topology and are the same in every frame; edges are
//! that epoch's diff records. Colors are resolved per element by
//! [`color_for`], a pure function of the element, its layer range and the
//! epoch's activity records.

use crate::activity::{self, range_for, ActivityClassifier, ActivityRecord};
use crate::scene::{Color, EdgeShape, Frame, NodeShape};
use crate::session::VisualizationSession;
use crate::weight_diff::{DiffRecord, RangeRecord};
use crate::layout::unit_y;
use crate::{Result, VizError};

/// A scene element whose color is being resolved.
#[derive(Debug, Clone, Copy)]
pub enum SceneElement<'a> {
    Node { layer: usize, unit: usize },
    Edge(&'a DiffRecord),
}

/// Color of `element` in an epoch.
///
/// Nodes take the activity of the first active edge touching them; edges are
/// classified against `range`, their layer's range (neutral when absent).
pub fn color_for(
    element: SceneElement<'_>,
    range: Option<&RangeRecord>,
    activities: &[ActivityRecord],
) -> Color {
    match element {
        SceneElement::Node { layer, unit } => {
            activity::node_color(activity::node_activity(layer, unit, activities))
        }
        SceneElement::Edge(record) => {
            activity::edge_color(range.and_then(|r| activity::classify(record, r)))
        }
    }
}

/// Turns session data into frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameBuilder {
    node_radius: f64,
}

impl FrameBuilder {
    pub fn new(node_radius: f64) -> Self {
        Self { node_radius }
    }

    /// Build the frame of `epoch`.
    ///
    /// Clears the session's activity records and refills them with this
    /// epoch's, so they always describe the frame just built.
    pub fn build(&self, session: &mut VisualizationSession, epoch: usize) -> Result<Frame> {
        let mut classifier = std::mem::take(&mut session.activities);
        let frame = self.build_with(session, epoch, &mut classifier);
        session.activities = classifier;
        frame
    }

    fn build_with(
        &self,
        session: &VisualizationSession,
        epoch: usize,
        classifier: &mut ActivityClassifier,
    ) -> Result<Frame> {
        let (records, ranges) = session.series().epoch(epoch).ok_or(VizError::EpochOutOfRange {
            epoch,
            epochs: session.num_epochs(),
        })?;

        let activities = classifier.classify_epoch(records, ranges);

        let layout = session.layout();
        let layer_spacing = layout.layer_spacing();
        let edges = records
            .iter()
            .map(|record| {
                let x1 = layout.node_x(record.layer);
                EdgeShape {
                    layer: record.layer,
                    source: record.source,
                    target: record.target,
                    x1,
                    y1: unit_y(record.unit_spacing, record.source),
                    x2: x1 + layer_spacing,
                    y2: unit_y(record.target_unit_spacing, record.target),
                    color: color_for(
                        SceneElement::Edge(record),
                        range_for(ranges, record.layer),
                        activities,
                    ),
                    diff: record.diff,
                }
            })
            .collect();

        Ok(Frame {
            epoch,
            nodes: self.nodes(session, activities),
            edges,
        })
    }

    /// Build every frame of the session in epoch order.
    pub fn build_all(&self, session: &mut VisualizationSession) -> Result<Vec<Frame>> {
        (0..session.num_epochs())
            .map(|epoch| self.build(session, epoch))
            .collect()
    }

    fn nodes(&self, session: &VisualizationSession, activities: &[ActivityRecord]) -> Vec<NodeShape> {
        let layout = session.layout();
        session
            .topology()
            .layers()
            .iter()
            .enumerate()
            .flat_map(|(layer, &size)| {
                let x = layout.node_x(layer);
                let spacing = layout.unit_spacing(layer).unwrap_or_default();
                (0..size).map(move |unit| (layer, unit, x, unit_y(spacing, unit)))
            })
            .map(|(layer, unit, x, y)| NodeShape {
                layer,
                unit,
                x,
                y,
                radius: self.node_radius,
                color: color_for(SceneElement::Node { layer, unit }, None, activities),
            })
            .collect()
    }
}
