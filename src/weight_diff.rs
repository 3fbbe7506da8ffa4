//! Per-epoch weight-change records.
//!
//! For every epoch, every learned layer and every `(destination, source)`
//! pair, a [`DiffRecord`] holds the weight and its absolute change since the
//! previous epoch. Epoch 0 has nothing to compare against, so its diffs are
//! `None`, which is distinct from a zero change.
//!
//! Alongside the records, each `(epoch, layer)` gets a [`RangeRecord`] with
//! the min/max diff of that layer in that epoch. Activity is judged against
//! this local range, so a layer's colors reflect its own change magnitude.

use crate::config::OutputLayerPolicy;
use crate::layout::Layout;
use crate::training_result::{EpochWeights, LayerWeights, TrainingResult, WeightTensor};
use crate::{Result, Topology, VizError};
use log::debug;
use serde::{Deserialize, Serialize};

/// Change of one weight between consecutive epochs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRecord {
    /// Learned-layer index; the edge runs from drawn layer `layer` to `layer + 1`
    pub layer: usize,
    /// Unit in drawn layer `layer`
    pub source: usize,
    /// Unit in drawn layer `layer + 1`
    pub target: usize,
    /// Weight in this epoch
    pub value: f64,
    /// `|value - previous value|`; `None` in epoch 0
    pub diff: Option<f64>,
    /// Vertical spacing of the source layer
    pub unit_spacing: f64,
    /// Vertical spacing of the target layer
    pub target_unit_spacing: f64,
}

/// Min/max diff of one layer within one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeRecord {
    pub layer_index: usize,
    pub min_diff: f64,
    pub max_diff: f64,
}

impl RangeRecord {
    /// Width of the range; zero when the layer did not vary.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max_diff - self.min_diff
    }
}

/// Diff and range records for every epoch, in timeline order.
///
/// `weights[e]` and `ranges[e]` belong to epoch `e`; the two lists always
/// have the same length when produced by [`WeightDiffComputer`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffSeries {
    pub weights: Vec<Vec<DiffRecord>>,
    pub ranges: Vec<Vec<RangeRecord>>,
}

impl DiffSeries {
    pub fn num_epochs(&self) -> usize {
        self.weights.len()
    }

    /// Whether every weight set has a matching range set.
    pub fn is_consistent(&self) -> bool {
        self.weights.len() == self.ranges.len()
    }

    /// Records and ranges of `epoch`.
    pub fn epoch(&self, epoch: usize) -> Option<(&[DiffRecord], &[RangeRecord])> {
        Some((self.weights.get(epoch)?, self.ranges.get(epoch)?))
    }

    /// Recompute unit spacings after the viewport changed.
    pub fn relayout(&mut self, layout: &Layout) {
        for record in self.weights.iter_mut().flatten() {
            if let (Some(src), Some(dst)) = (
                layout.unit_spacing(record.layer),
                layout.unit_spacing(record.layer + 1),
            ) {
                record.unit_spacing = src;
                record.target_unit_spacing = dst;
            }
        }
    }
}

/// Turns a training result document into a [`DiffSeries`].
#[derive(Debug, Clone)]
pub struct WeightDiffComputer<'a> {
    topology: &'a Topology,
    layout: &'a Layout,
    policy: OutputLayerPolicy,
}

impl<'a> WeightDiffComputer<'a> {
    pub fn new(topology: &'a Topology, layout: &'a Layout, policy: OutputLayerPolicy) -> Self {
        Self {
            topology,
            layout,
            policy,
        }
    }

    /// Compute diff and range records for every epoch of `doc`.
    ///
    /// Fails with [`VizError::Computation`] when a layer changes shape
    /// between epochs, is missing from the previous epoch, or has no drawn
    /// layers to connect.
    pub fn compute(&self, doc: &TrainingResult) -> Result<DiffSeries> {
        let mut series = DiffSeries {
            weights: Vec::with_capacity(doc.num_epochs()),
            ranges: Vec::with_capacity(doc.num_epochs()),
        };

        let mut previous: Option<&EpochWeights> = None;
        for epoch in doc.epochs() {
            let (records, ranges) = self.compute_epoch(epoch, previous)?;
            debug!(
                "epoch {}: {} diff records across {} layers",
                epoch.index,
                records.len(),
                ranges.len()
            );
            series.weights.push(records);
            series.ranges.push(ranges);
            previous = Some(epoch);
        }

        Ok(series)
    }

    fn learned_layers<'e>(&self, epoch: &'e EpochWeights) -> impl Iterator<Item = &'e LayerWeights> {
        let policy = self.policy;
        epoch.layers.iter().filter(move |l| {
            !l.is_input() && !(policy == OutputLayerPolicy::Exclude && l.is_output())
        })
    }

    fn compute_epoch(
        &self,
        epoch: &EpochWeights,
        previous: Option<&EpochWeights>,
    ) -> Result<(Vec<DiffRecord>, Vec<RangeRecord>)> {
        let mut records = Vec::new();
        let mut ranges = Vec::new();

        for (layer_index, layer) in self.learned_layers(epoch).enumerate() {
            let prior = match previous {
                None => None,
                Some(prev) => Some(self.prior_tensor(epoch.index, layer, prev)?),
            };

            let (unit_spacing, target_unit_spacing) = match (
                self.layout.unit_spacing(layer_index),
                self.layout.unit_spacing(layer_index + 1),
            ) {
                (Some(src), Some(dst)) => (src, dst),
                _ => {
                    return Err(VizError::computation(
                        epoch.index,
                        format!(
                            "layer '{}' (index {}) has no matching layers in {}",
                            layer.name, layer_index, self.topology
                        ),
                    ))
                }
            };

            let mut range = RangeRecord {
                layer_index,
                min_diff: 0.0,
                max_diff: 0.0,
            };
            let mut seeded = false;

            for (target, row) in layer.tensor.rows().enumerate() {
                for (source, &value) in row.iter().enumerate() {
                    let diff = prior
                        .and_then(|p| p.get(target, source))
                        .map(|old| (value - old).abs());

                    if let Some(d) = diff {
                        if !seeded && source == 0 {
                            range.min_diff = d;
                            range.max_diff = d;
                            seeded = true;
                        } else if seeded {
                            range.min_diff = range.min_diff.min(d);
                            range.max_diff = range.max_diff.max(d);
                        }
                    }

                    records.push(DiffRecord {
                        layer: layer_index,
                        source,
                        target,
                        value,
                        diff,
                        unit_spacing,
                        target_unit_spacing,
                    });
                }
            }

            ranges.push(range);
        }

        Ok((records, ranges))
    }

    fn prior_tensor<'p>(
        &self,
        epoch: usize,
        layer: &LayerWeights,
        previous: &'p EpochWeights,
    ) -> Result<&'p WeightTensor> {
        let prior = previous.layer(&layer.name).ok_or_else(|| {
            VizError::computation(
                epoch,
                format!("layer '{}' is missing from {}", layer.name, previous.label),
            )
        })?;

        if prior.tensor.shape() != layer.tensor.shape() {
            return Err(VizError::computation(
                epoch,
                format!(
                    "layer '{}' changed shape from {:?} to {:?}",
                    layer.name,
                    prior.tensor.shape(),
                    layer.tensor.shape()
                ),
            ));
        }

        Ok(&prior.tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Viewport;
    use approx::assert_relative_eq;

    fn layer(name: &str, rows: Vec<Vec<f64>>) -> LayerWeights {
        LayerWeights {
            name: name.to_string(),
            tensor: WeightTensor::new(rows).unwrap(),
        }
    }

    fn epoch(index: usize, layers: Vec<LayerWeights>) -> EpochWeights {
        EpochWeights {
            index,
            label: format!("epoch_{}", index),
            layers,
        }
    }

    /// Topology [2, 10]: one edge layer of 10 x 2 weights.
    fn two_unit_doc(first: f64, second: f64) -> (Topology, TrainingResult) {
        let topology = Topology::from_hidden(&[2]).unwrap();
        let rows = |v: f64| (0..10).map(|d| vec![v * d as f64, v]).collect::<Vec<_>>();
        let doc = TrainingResult::new(vec![
            epoch(0, vec![layer("input", vec![vec![0.0]; 2]), layer("output", rows(first))]),
            epoch(1, vec![layer("input", vec![vec![0.0]; 2]), layer("output", rows(second))]),
        ])
        .unwrap();
        (topology, doc)
    }

    #[test]
    fn test_epoch_zero_has_undefined_diffs() {
        let (topology, doc) = two_unit_doc(1.0, 2.0);
        let layout = Layout::new(&topology, Viewport::default());
        let series = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Include)
            .compute(&doc)
            .unwrap();

        assert_eq!(series.num_epochs(), 2);
        assert!(series.weights[0].iter().all(|r| r.diff.is_none()));
        assert_eq!(
            series.ranges[0],
            vec![RangeRecord {
                layer_index: 0,
                min_diff: 0.0,
                max_diff: 0.0
            }]
        );
    }

    #[test]
    fn test_diffs_and_ranges() {
        let (topology, doc) = two_unit_doc(1.0, 2.0);
        let layout = Layout::new(&topology, Viewport::default());
        let series = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Include)
            .compute(&doc)
            .unwrap();

        let records = &series.weights[1];
        assert_eq!(records.len(), 20);
        // source 0 of target d moved from d to 2d, source 1 moved from 1 to 2
        let r = records
            .iter()
            .find(|r| r.target == 7 && r.source == 0)
            .unwrap();
        assert_relative_eq!(r.diff.unwrap(), 7.0);
        assert_relative_eq!(r.value, 14.0);

        let range = series.ranges[1][0];
        assert_relative_eq!(range.min_diff, 0.0);
        assert_relative_eq!(range.max_diff, 9.0);
    }

    #[test]
    fn test_record_layout_fields() {
        let (topology, doc) = two_unit_doc(1.0, 2.0);
        let layout = Layout::new(&topology, Viewport::new(300.0, 100.0).unwrap());
        let series = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Include)
            .compute(&doc)
            .unwrap();

        let r = &series.weights[0][0];
        assert_relative_eq!(r.unit_spacing, 50.0);
        assert_relative_eq!(r.target_unit_spacing, 10.0);
    }

    #[test]
    fn test_input_layer_shifts_indices() {
        let topology = Topology::from_hidden(&[2, 3]).unwrap();
        let layout = Layout::new(&topology, Viewport::default());
        let doc = TrainingResult::synthetic(&topology, 4, 2, 3).unwrap();
        let series = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Include)
            .compute(&doc)
            .unwrap();

        let layers: Vec<_> = series.ranges[1].iter().map(|r| r.layer_index).collect();
        assert_eq!(layers, vec![0, 1]);
        assert_eq!(series.weights[1].len(), topology.edge_count());
        assert!(series.weights[1]
            .iter()
            .filter(|r| r.layer == 0)
            .all(|r| r.source < 2 && r.target < 3));
    }

    #[test]
    fn test_exclude_output_policy() {
        let topology = Topology::from_hidden(&[2, 3]).unwrap();
        let layout = Layout::new(&topology, Viewport::default());
        let doc = TrainingResult::synthetic(&topology, 4, 2, 3).unwrap();
        let series = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Exclude)
            .compute(&doc)
            .unwrap();

        assert_eq!(series.ranges[0].len(), 1);
        assert_eq!(series.weights[0].len(), 6);
    }

    #[test]
    fn test_shape_change_is_error() {
        let topology = Topology::from_hidden(&[2]).unwrap();
        let layout = Layout::new(&topology, Viewport::default());
        let doc = TrainingResult::new(vec![
            epoch(0, vec![layer("output", vec![vec![0.0, 0.0]; 10])]),
            epoch(1, vec![layer("output", vec![vec![0.0, 0.0]; 9])]),
        ])
        .unwrap();

        let err = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Include)
            .compute(&doc)
            .unwrap_err();
        assert!(matches!(err, VizError::Computation { epoch: 1, .. }));
    }

    #[test]
    fn test_missing_prior_layer_is_error() {
        let topology = Topology::from_hidden(&[2]).unwrap();
        let layout = Layout::new(&topology, Viewport::default());
        let doc = TrainingResult::new(vec![
            epoch(0, vec![layer("input", vec![vec![0.0]; 2])]),
            epoch(1, vec![layer("output", vec![vec![0.0, 0.0]; 10])]),
        ])
        .unwrap();

        let err = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Include)
            .compute(&doc)
            .unwrap_err();
        assert!(matches!(err, VizError::Computation { epoch: 1, .. }));
    }

    #[test]
    fn test_layer_beyond_topology_is_error() {
        let topology = Topology::from_hidden(&[2]).unwrap();
        let layout = Layout::new(&topology, Viewport::default());
        let doc = TrainingResult::new(vec![epoch(
            0,
            vec![
                layer("hidden_1", vec![vec![0.0, 0.0]; 10]),
                layer("output", vec![vec![0.0; 10]; 10]),
            ],
        )])
        .unwrap();

        let err = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Include)
            .compute(&doc)
            .unwrap_err();
        assert!(matches!(err, VizError::Computation { epoch: 0, .. }));
    }

    #[test]
    fn test_relayout() {
        let (topology, doc) = two_unit_doc(1.0, 2.0);
        let layout = Layout::new(&topology, Viewport::default());
        let mut series = WeightDiffComputer::new(&topology, &layout, OutputLayerPolicy::Include)
            .compute(&doc)
            .unwrap();

        let resized = Layout::new(&topology, Viewport::new(100.0, 20.0).unwrap());
        series.relayout(&resized);
        assert!(series.weights.iter().flatten().all(|r| r.unit_spacing == 10.0));
        assert!(series
            .weights
            .iter()
            .flatten()
            .all(|r| r.target_unit_spacing == 2.0));
    }
}
