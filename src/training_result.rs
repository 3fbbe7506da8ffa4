//! Training result documents.
//!
//! A result document maps epoch labels (`epoch_0` .. `epoch_{N-1}`) to the
//! weights recorded at the end of that epoch. Each epoch maps layer names to
//! a 2D tensor indexed `[destination][source]`:
//!
//! ```json
//! {
//!   "epoch_0": { "input": [[...]], "hidden_1": [[...]], "output": [[...]] },
//!   "epoch_1": { ... }
//! }
//! ```
//!
//! The `input` entry marks the first layer and carries no drawable weights.
//! Layer order inside an epoch is the order of the document.

use crate::{Result, Topology, VizError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

/// Name of the marker layer excluded from diffing.
pub const INPUT_LAYER: &str = "input";

/// Name of the output layer.
pub const OUTPUT_LAYER: &str = "output";

const EPOCH_PREFIX: &str = "epoch_";

/// Rectangular matrix of finite weights, indexed `[destination][source]`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTensor {
    values: Vec<f64>,
    destinations: usize,
    sources: usize,
}

impl WeightTensor {
    /// Build a tensor from destination-major rows.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let destinations = rows.len();
        let sources = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(destinations * sources);

        for (dst, row) in rows.into_iter().enumerate() {
            if row.len() != sources {
                return Err(VizError::InvalidDocument(format!(
                    "ragged tensor: row {} has {} entries, expected {}",
                    dst,
                    row.len(),
                    sources
                )));
            }
            if let Some(src) = row.iter().position(|v| !v.is_finite()) {
                return Err(VizError::InvalidDocument(format!(
                    "non-finite weight at [{}][{}]",
                    dst, src
                )));
            }
            values.extend(row);
        }

        Ok(Self {
            values,
            destinations,
            sources,
        })
    }

    /// `(destinations, sources)`
    pub fn shape(&self) -> (usize, usize) {
        (self.destinations, self.sources)
    }

    #[inline]
    pub fn get(&self, destination: usize, source: usize) -> Option<f64> {
        if destination < self.destinations && source < self.sources {
            Some(self.values[destination * self.sources + source])
        } else {
            None
        }
    }

    /// Weights of one destination unit, by source.
    pub fn row(&self, destination: usize) -> Option<&[f64]> {
        if destination < self.destinations {
            let start = destination * self.sources;
            Some(&self.values[start..start + self.sources])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.destinations).filter_map(move |dst| self.row(dst))
    }

    fn to_value(&self) -> Value {
        Value::Array(
            self.rows()
                .map(|row| Value::Array(row.iter().map(|&v| Value::from(v)).collect()))
                .collect(),
        )
    }
}

/// Weights of one named layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerWeights {
    pub name: String,
    pub tensor: WeightTensor,
}

impl LayerWeights {
    pub fn is_input(&self) -> bool {
        self.name == INPUT_LAYER
    }

    pub fn is_output(&self) -> bool {
        self.name == OUTPUT_LAYER
    }
}

/// All layer weights recorded for one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochWeights {
    /// Position on the animation timeline
    pub index: usize,
    /// Label as found in the document
    pub label: String,
    /// Layers in document order
    pub layers: Vec<LayerWeights>,
}

impl EpochWeights {
    /// Find a layer by name.
    pub fn layer(&self, name: &str) -> Option<&LayerWeights> {
        self.layers.iter().find(|l| l.name == name)
    }
}

/// A complete training result document, epochs in timeline order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingResult {
    epochs: Vec<EpochWeights>,
}

impl TrainingResult {
    /// Build from epochs; indices must be exactly `0..N`, N >= 1.
    pub fn new(mut epochs: Vec<EpochWeights>) -> Result<Self> {
        if epochs.is_empty() {
            return Err(VizError::InvalidDocument("document has no epochs".to_string()));
        }

        epochs.sort_by_key(|e| e.index);
        for (expected, epoch) in epochs.iter().enumerate() {
            if epoch.index != expected {
                return Err(VizError::InvalidDocument(format!(
                    "epoch sequence broken at '{}': expected {}{}",
                    epoch.label, EPOCH_PREFIX, expected
                )));
            }
        }

        Ok(Self { epochs })
    }

    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let root: Map<String, Value> = serde_json::from_str(json)?;
        let mut epochs = Vec::with_capacity(root.len());

        for (label, value) in root {
            let index = parse_epoch_label(&label)?;
            let Value::Object(layer_map) = value else {
                return Err(VizError::InvalidDocument(format!(
                    "'{}' is not a mapping of layer names to tensors",
                    label
                )));
            };

            let mut layers = Vec::with_capacity(layer_map.len());
            for (name, tensor) in layer_map {
                let rows: Vec<Vec<f64>> = serde_json::from_value(tensor).map_err(|e| {
                    VizError::InvalidDocument(format!("'{}' layer '{}': {}", label, name, e))
                })?;
                let tensor = WeightTensor::new(rows).map_err(|e| {
                    VizError::InvalidDocument(format!("'{}' layer '{}': {}", label, name, e))
                })?;
                layers.push(LayerWeights { name, tensor });
            }

            epochs.push(EpochWeights {
                index,
                label,
                layers,
            });
        }

        Self::new(epochs)
    }

    /// Read and parse a document from disk.
    pub fn from_json_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        let root: Map<String, Value> = self
            .epochs
            .iter()
            .map(|epoch| {
                let layers: Map<String, Value> = epoch
                    .layers
                    .iter()
                    .map(|l| (l.name.clone(), l.tensor.to_value()))
                    .collect();
                (epoch.label.clone(), Value::Object(layers))
            })
            .collect();
        Ok(serde_json::to_string(&Value::Object(root))?)
    }

    pub fn epochs(&self) -> &[EpochWeights] {
        &self.epochs
    }

    pub fn num_epochs(&self) -> usize {
        self.epochs.len()
    }

    pub fn epoch(&self, index: usize) -> Option<&EpochWeights> {
        self.epochs.get(index)
    }

    /// Generate a deterministic document shaped to `topology`.
    ///
    /// Weights start uniform in `[-1, 1]` and random-walk between epochs;
    /// roughly one weight in ten takes a large step so that every epoch
    /// shows some activity.
    pub fn synthetic(
        topology: &Topology,
        input_size: usize,
        num_epochs: usize,
        seed: u64,
    ) -> Result<Self> {
        if input_size == 0 || num_epochs == 0 {
            return Err(VizError::InvalidParameter(
                "synthetic documents need inputs and at least one epoch".to_string(),
            ));
        }

        let layers = topology.layers();
        let last = layers.len() - 1;
        let mut shapes = Vec::with_capacity(layers.len());
        shapes.push((INPUT_LAYER.to_string(), layers[0], input_size));
        for k in 1..=last {
            let name = if k == last {
                OUTPUT_LAYER.to_string()
            } else {
                format!("hidden_{}", k)
            };
            shapes.push((name, layers[k], layers[k - 1]));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut current: Vec<Vec<f64>> = shapes
            .iter()
            .map(|&(_, dst, src)| (0..dst * src).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect();

        let mut epochs = Vec::with_capacity(num_epochs);
        for index in 0..num_epochs {
            if index > 0 {
                for w in current.iter_mut().flatten() {
                    let step: f64 = rng.gen_range(-0.02..0.02);
                    *w += if rng.gen_bool(0.1) { step * 10.0 } else { step };
                }
            }

            let layers = shapes
                .iter()
                .zip(&current)
                .map(|((name, dst, src), values)| -> Result<LayerWeights> {
                    let rows = values.chunks(*src).take(*dst).map(<[f64]>::to_vec).collect();
                    Ok(LayerWeights {
                        name: name.clone(),
                        tensor: WeightTensor::new(rows)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            epochs.push(EpochWeights {
                index,
                label: format!("{}{}", EPOCH_PREFIX, index),
                layers,
            });
        }

        Self::new(epochs)
    }
}

fn parse_epoch_label(label: &str) -> Result<usize> {
    label
        .strip_prefix(EPOCH_PREFIX)
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| VizError::InvalidDocument(format!("unexpected epoch label '{}'", label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_indexing() {
        let t = WeightTensor::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(t.shape(), (2, 3));
        assert_eq!(t.get(1, 0), Some(4.0));
        assert_eq!(t.get(0, 2), Some(3.0));
        assert_eq!(t.get(2, 0), None);
        assert_eq!(t.row(1), Some(&[4.0, 5.0, 6.0][..]));
    }

    #[test]
    fn test_tensor_rejects_ragged_rows() {
        let err = WeightTensor::new(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, VizError::InvalidDocument(_)));
    }

    #[test]
    fn test_tensor_rejects_non_finite() {
        assert!(WeightTensor::new(vec![vec![1.0, f64::NAN]]).is_err());
    }

    #[test]
    fn test_parse_orders_epochs_numerically() {
        let json = r#"{
            "epoch_10": { "input": [[0.0]], "output": [[1.0]] },
            "epoch_2":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_0":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_1":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_3":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_4":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_5":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_6":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_7":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_8":  { "input": [[0.0]], "output": [[1.0]] },
            "epoch_9":  { "input": [[0.0]], "output": [[1.0]] }
        }"#;
        let doc = TrainingResult::from_json(json).unwrap();
        let labels: Vec<_> = doc.epochs().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels[2], "epoch_2");
        assert_eq!(labels[10], "epoch_10");
    }

    #[test]
    fn test_parse_preserves_layer_order() {
        let json = r#"{ "epoch_0": { "input": [[0.0]], "zeta": [[1.0]], "alpha": [[2.0]], "output": [[3.0]] } }"#;
        let doc = TrainingResult::from_json(json).unwrap();
        let names: Vec<_> = doc.epochs()[0].layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["input", "zeta", "alpha", "output"]);
    }

    #[test]
    fn test_parse_rejects_gaps_and_bad_labels() {
        let gap = r#"{ "epoch_0": {}, "epoch_2": {} }"#;
        assert!(matches!(
            TrainingResult::from_json(gap),
            Err(VizError::InvalidDocument(_))
        ));

        let label = r#"{ "step_0": {} }"#;
        assert!(matches!(
            TrainingResult::from_json(label),
            Err(VizError::InvalidDocument(_))
        ));

        assert!(matches!(
            TrainingResult::from_json("{}"),
            Err(VizError::InvalidDocument(_))
        ));

        assert!(matches!(
            TrainingResult::from_json("[1, 2]"),
            Err(VizError::Json(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let topology = Topology::from_hidden(&[3, 2]).unwrap();
        let doc = TrainingResult::synthetic(&topology, 4, 3, 7).unwrap();
        let parsed = TrainingResult::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_json_preserves_every_weight_bit() {
        let value: f64 = 0.9118509046594983;
        let doc = TrainingResult::new(vec![EpochWeights {
            index: 0,
            label: "epoch_0".to_string(),
            layers: vec![LayerWeights {
                name: OUTPUT_LAYER.to_string(),
                tensor: WeightTensor::new(vec![vec![value, 1.0 / 3.0, -2.0e-17]]).unwrap(),
            }],
        }])
        .unwrap();

        let parsed = TrainingResult::from_json(&doc.to_json().unwrap()).unwrap();
        let tensor = &parsed.epoch(0).unwrap().layers[0].tensor;
        assert_eq!(tensor.get(0, 0).map(f64::to_bits), Some(value.to_bits()));
        assert_eq!(tensor.get(0, 1).map(f64::to_bits), Some((1.0f64 / 3.0).to_bits()));
        assert_eq!(tensor.get(0, 2).map(f64::to_bits), Some((-2.0e-17f64).to_bits()));
    }

    #[test]
    fn test_synthetic_shapes() {
        let topology = Topology::from_hidden(&[5, 3]).unwrap();
        let doc = TrainingResult::synthetic(&topology, 8, 4, 1).unwrap();

        assert_eq!(doc.num_epochs(), 4);
        let epoch = doc.epoch(2).unwrap();
        let shapes: Vec<_> = epoch
            .layers
            .iter()
            .map(|l| (l.name.as_str(), l.tensor.shape()))
            .collect();
        assert_eq!(
            shapes,
            vec![("input", (5, 8)), ("hidden_1", (3, 5)), ("output", (10, 3))]
        );
    }

    #[test]
    fn test_synthetic_is_deterministic() {
        let topology = Topology::from_hidden(&[4]).unwrap();
        let a = TrainingResult::synthetic(&topology, 3, 2, 99).unwrap();
        let b = TrainingResult::synthetic(&topology, 3, 2, 99).unwrap();
        assert_eq!(a, b);
    }
}
