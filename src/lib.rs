//! Weightscope - Training Visualization Engine for Multilayer Perceptrons
//!
//! Weightscope animates how a small MLP's weights change over training. Given
//! a training result document (weights per layer per epoch), it produces one
//! node-and-edge scene per epoch in which edges and nodes light up where the
//! weights moved most, and plays those scenes back on a virtual timeline.
//!
//! # Pipeline
//!
//! - **Topology**: layer sizes parsed from the document name, e.g. `MLP[10,10].json`
//! - **WeightDiffComputer**: per-edge absolute weight change and per-layer ranges, epoch by epoch
//! - **Activity classification**: edges whose change is large relative to their layer
//!   are marked medium or high, and the activity is attributed to their endpoints
//! - **FrameBuilder**: positioned, colored nodes and edges per epoch
//! - **AnimationScheduler**: emits frames to a [`SceneRenderer`] at a fixed interval,
//!   cancellable at any time
//!
//! The drawing surface and the document transport are collaborators behind
//! the [`SceneRenderer`] and [`ResultSource`] traits.
//!
//! # Examples
//!
//! ## Parsing a topology
//!
//! ```
//! use weightscope::Topology;
//!
//! let topology = Topology::parse("MLP[10,10].json").unwrap();
//! assert_eq!(topology.layers(), &[10, 10, 10]);
//! assert_eq!(topology.node_count(), 30);
//! assert_eq!(topology.edge_count(), 200);
//! ```
//!
//! ## Building frames
//!
//! ```
//! use weightscope::{
//!     FrameBuilder, OutputLayerPolicy, Topology, TrainingResult, Viewport, VisualizationSession,
//! };
//!
//! let topology = Topology::parse("MLP[2].json").unwrap();
//! let doc = TrainingResult::synthetic(&topology, 4, 3, 42).unwrap();
//! let mut session = VisualizationSession::compute(
//!     topology,
//!     Viewport::default(),
//!     &doc,
//!     OutputLayerPolicy::Include,
//! )
//! .unwrap();
//!
//! let frames = FrameBuilder::new(5.0).build_all(&mut session).unwrap();
//! assert_eq!(frames.len(), 3);
//! assert!(frames[0].edges.iter().all(|e| e.diff.is_none()));
//! assert!(frames[1].edges.iter().all(|e| e.diff.is_some()));
//! ```
//!
//! # Logging
//!
//! Weightscope logs through the `log` facade and never installs a logger;
//! hosts choose one (e.g. `env_logger`).

// Module declarations
pub mod error;
pub mod topology;
pub mod config;
pub mod layout;
pub mod training_result;

// Pipeline
pub mod weight_diff;
pub mod activity;
pub mod scene;
pub mod session;
pub mod frame_builder;
pub mod scheduler;

// Host boundary
pub mod source;
pub mod visualizer;

#[cfg(feature = "wasm")]
pub mod wasm_interface;

// Re-exports for convenient access
pub use error::{Result, VizError};
pub use topology::{default_sources, Topology, TopologySource, OUTPUT_LAYER_SIZE};
pub use config::{OutputLayerPolicy, VisualizerConfig};
pub use layout::{Layout, Viewport};
pub use training_result::{EpochWeights, LayerWeights, TrainingResult, WeightTensor};

pub use weight_diff::{DiffRecord, DiffSeries, RangeRecord, WeightDiffComputer};
pub use activity::{ActivityClassifier, ActivityLevel, ActivityRecord};
pub use scene::{
    Color, EdgeKey, EdgeShape, Frame, NodeKey, NodeShape, SceneBuffer, SceneDelta, SceneRenderer,
    Transition,
};
pub use session::VisualizationSession;
pub use frame_builder::{color_for, FrameBuilder, SceneElement};
pub use scheduler::{
    AnimationScheduler, AnimationState, Completion, SchedulerStatus, TaskHandle, Timeline,
    CONSISTENCY_DIAGNOSTIC,
};

pub use source::{AssetDirectory, InMemorySource, ResultSource};
pub use visualizer::{Visualizer, VizOptions};

#[cfg(feature = "wasm")]
pub use wasm_interface::WasmVisualizer;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const NAME: &str = "Weightscope";

/// Get version string
pub fn version() -> String {
    format!("{} v{}", NAME, VERSION)
}
