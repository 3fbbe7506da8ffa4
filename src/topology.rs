//! Network topology derived from a filename-encoded layer list.
//!
//! Training result documents are named after the network that produced them,
//! e.g. `MLP[20,15,10].json`. The bracketed list holds the hidden-layer sizes;
//! every network ends in a fixed output layer of [`OUTPUT_LAYER_SIZE`] units
//! (one-hot classification).
//!
//! # Example
//!
//! ```
//! use weightscope::Topology;
//!
//! let topology = Topology::parse("MLP[20, 15, 10].json").unwrap();
//! assert_eq!(topology.layers(), &[20, 15, 10, 10]);
//! assert_eq!(topology.display_name(), "MLP[20, 15, 10]");
//! ```

use crate::{Result, VizError};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the implicit output layer.
pub const OUTPUT_LAYER_SIZE: usize = 10;

const SPEC_PREFIX: &str = "MLP[";
const SPEC_SUFFIX: &str = "].json";

/// Ordered layer sizes of a network, hidden layers first, output layer last.
///
/// Always holds at least one hidden layer and no zero-sized layer.
/// Deserialized values are checked against the same rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TopologyRepr")]
pub struct Topology {
    layers: Vec<usize>,
}

/// Unchecked serialized form of [`Topology`].
#[derive(Deserialize)]
struct TopologyRepr {
    layers: Vec<usize>,
}

impl TryFrom<TopologyRepr> for Topology {
    type Error = VizError;

    fn try_from(repr: TopologyRepr) -> Result<Self> {
        match repr.layers.split_last() {
            Some((&OUTPUT_LAYER_SIZE, hidden)) => Self::from_hidden(hidden),
            _ => Err(VizError::InvalidParameter(format!(
                "topology must end in an output layer of {} units, got {:?}",
                OUTPUT_LAYER_SIZE, repr.layers
            ))),
        }
    }
}

impl Topology {
    /// Build a topology from hidden-layer sizes, appending the output layer.
    pub fn from_hidden(hidden: &[usize]) -> Result<Self> {
        if hidden.is_empty() {
            return Err(VizError::InvalidParameter(
                "topology needs at least one hidden layer".to_string(),
            ));
        }
        if let Some(pos) = hidden.iter().position(|&size| size == 0) {
            return Err(VizError::InvalidParameter(format!(
                "hidden layer {} has size 0",
                pos
            )));
        }

        let mut layers = hidden.to_vec();
        layers.push(OUTPUT_LAYER_SIZE);
        Ok(Self { layers })
    }

    /// Parse a filename of the form `MLP[<int>(,<int>)*].json`.
    ///
    /// Whitespace around the sizes is ignored. A leading directory is
    /// tolerated, since only the bracketed list carries meaning.
    pub fn parse(filename: &str) -> Result<Self> {
        let start = filename
            .find(SPEC_PREFIX)
            .ok_or_else(|| VizError::parse(filename, format!("missing '{}' prefix", SPEC_PREFIX)))?;
        let inner = filename[start + SPEC_PREFIX.len()..]
            .strip_suffix(SPEC_SUFFIX)
            .ok_or_else(|| VizError::parse(filename, format!("missing '{}' suffix", SPEC_SUFFIX)))?;

        if inner.trim().is_empty() {
            return Err(VizError::parse(filename, "no hidden layers"));
        }

        let hidden = inner
            .split(',')
            .map(|token| parse_layer_size(filename, token))
            .collect::<Result<Vec<_>>>()?;

        Self::from_hidden(&hidden)
    }

    /// All layer sizes, output layer included.
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    /// Hidden-layer sizes in declared order.
    pub fn hidden_layers(&self) -> &[usize] {
        &self.layers[..self.layers.len() - 1]
    }

    /// Number of drawn layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Size of layer `index`, if it exists.
    pub fn layer_size(&self, index: usize) -> Option<usize> {
        self.layers.get(index).copied()
    }

    /// Size of the output layer; the same for every topology.
    pub fn output_size(&self) -> usize {
        OUTPUT_LAYER_SIZE
    }

    /// Total number of nodes across all layers.
    pub fn node_count(&self) -> usize {
        self.layers.iter().sum()
    }

    /// Number of edges between adjacent layers.
    pub fn edge_count(&self) -> usize {
        self.layers
            .iter()
            .tuple_windows()
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Human-readable name, e.g. `MLP[10, 10]`.
    pub fn display_name(&self) -> String {
        format!("MLP[{}]", self.hidden_layers().iter().join(", "))
    }

    /// Canonical filename, e.g. `MLP[10,10].json`.
    pub fn filename(&self) -> String {
        format!(
            "{}{}{}",
            SPEC_PREFIX,
            self.hidden_layers().iter().join(","),
            SPEC_SUFFIX
        )
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn parse_layer_size(filename: &str, token: &str) -> Result<usize> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VizError::parse(
            filename,
            format!("'{}' is not a positive integer", token),
        ));
    }

    match token.parse::<usize>() {
        Ok(0) => Err(VizError::parse(filename, "layer size must be positive")),
        Ok(size) => Ok(size),
        Err(e) => Err(VizError::parse(filename, format!("'{}': {}", token, e))),
    }
}

/// A selectable training result document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySource {
    /// Filename handed to the fetch collaborator
    pub value: String,
    /// Label shown to the user
    pub view_value: String,
}

impl TopologySource {
    /// Parse the topology this source encodes.
    pub fn topology(&self) -> Result<Topology> {
        Topology::parse(&self.value)
    }
}

/// The training result documents shipped with the application.
pub fn default_sources() -> Vec<TopologySource> {
    [&[10, 10][..], &[20, 15, 10][..]]
        .iter()
        .filter_map(|hidden| Topology::from_hidden(hidden).ok())
        .map(|t| TopologySource {
            value: t.filename(),
            view_value: t.display_name(),
        })
        .collect()
}
