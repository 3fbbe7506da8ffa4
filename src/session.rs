//! State of one visualization run.

use crate::activity::{ActivityClassifier, ActivityRecord};
use crate::config::OutputLayerPolicy;
use crate::layout::{Layout, Viewport};
use crate::training_result::TrainingResult;
use crate::weight_diff::{DiffSeries, WeightDiffComputer};
use crate::{Result, Topology};
use log::debug;

/// Everything derived for one run: topology, layout, diff series and the
/// activity records of the frame being built.
///
/// Owned by the scheduler for the lifetime of a run and lent to each
/// component call.
#[derive(Debug, Clone)]
pub struct VisualizationSession {
    topology: Topology,
    layout: Layout,
    series: DiffSeries,
    pub(crate) activities: ActivityClassifier,
}

impl VisualizationSession {
    /// Assemble a session from an already computed series.
    pub fn new(topology: Topology, viewport: Viewport, series: DiffSeries) -> Self {
        let layout = Layout::new(&topology, viewport);
        let mut series = series;
        series.relayout(&layout);
        Self {
            topology,
            layout,
            series,
            activities: ActivityClassifier::new(),
        }
    }

    /// Compute the diff series of `doc` and wrap it in a session.
    pub fn compute(
        topology: Topology,
        viewport: Viewport,
        doc: &TrainingResult,
        policy: OutputLayerPolicy,
    ) -> Result<Self> {
        viewport.validate()?;
        let layout = Layout::new(&topology, viewport);
        let series = WeightDiffComputer::new(&topology, &layout, policy).compute(doc)?;
        Ok(Self {
            topology,
            layout,
            series,
            activities: ActivityClassifier::new(),
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn series(&self) -> &DiffSeries {
        &self.series
    }

    pub fn num_epochs(&self) -> usize {
        self.series.num_epochs()
    }

    /// Activity records of the most recently built frame.
    pub fn activities(&self) -> &[ActivityRecord] {
        self.activities.activities()
    }

    pub fn clear_activities(&mut self) {
        self.activities.clear();
    }

    /// Lay the session out for a new viewport. Returns whether anything changed.
    pub fn relayout(&mut self, viewport: Viewport) -> bool {
        if viewport == self.layout.viewport() || viewport.validate().is_err() {
            return false;
        }
        debug!(
            "relayout {}x{} -> {}x{}",
            self.layout.viewport().width,
            self.layout.viewport().height,
            viewport.width,
            viewport.height
        );
        self.layout = Layout::new(&self.topology, viewport);
        self.series.relayout(&self.layout);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_and_relayout() {
        let topology = Topology::from_hidden(&[3]).unwrap();
        let doc = TrainingResult::synthetic(&topology, 2, 3, 5).unwrap();
        let mut session = VisualizationSession::compute(
            topology,
            Viewport::default(),
            &doc,
            OutputLayerPolicy::Include,
        )
        .unwrap();

        assert_eq!(session.num_epochs(), 3);
        assert!(!session.relayout(Viewport::default()));

        let small = Viewport::new(40.0, 30.0).unwrap();
        assert!(session.relayout(small));
        assert_eq!(session.layout().viewport(), small);
        assert!(session.series().weights[0]
            .iter()
            .all(|r| r.unit_spacing == 10.0 && r.target_unit_spacing == 3.0));
    }

    #[test]
    fn test_compute_rejects_bad_viewport() {
        let topology = Topology::from_hidden(&[3]).unwrap();
        let doc = TrainingResult::synthetic(&topology, 2, 1, 5).unwrap();
        let viewport = Viewport {
            width: -1.0,
            height: 10.0,
        };
        assert!(VisualizationSession::compute(topology, viewport, &doc, OutputLayerPolicy::Include)
            .is_err());
    }
}
