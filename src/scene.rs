//! Scene descriptors and the drawing-surface boundary.
//!
//! A [`Frame`] is everything a renderer needs for one epoch: positioned,
//! colored nodes and edges. Renderers implement [`SceneRenderer`]; the engine
//! never draws anything itself.
//!
//! [`SceneBuffer`] is a headless retained surface. It joins each frame
//! against what it currently holds by element key, so hosts can replay the
//! enter/update/exit sets onto a real canvas.

use crate::layout::Viewport;
use crate::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// RGBA color; `a` is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// CSS notation, e.g. `rgba(255, 0, 0, 0.35)`.
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Identity of a node across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub layer: usize,
    pub unit: usize,
}

/// Identity of an edge across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub layer: usize,
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeShape {
    pub layer: usize,
    pub unit: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
}

impl NodeShape {
    pub fn key(&self) -> NodeKey {
        NodeKey {
            layer: self.layer,
            unit: self.unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeShape {
    pub layer: usize,
    pub source: usize,
    pub target: usize,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: Color,
    /// Weight change behind this edge; `None` in the first epoch
    pub diff: Option<f64>,
}

impl EdgeShape {
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            layer: self.layer,
            source: self.source,
            target: self.target,
        }
    }
}

/// One epoch's fully resolved scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub epoch: usize,
    pub nodes: Vec<NodeShape>,
    pub edges: Vec<EdgeShape>,
}

impl Frame {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// How long element changes take to animate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub duration: f64,
}

/// A drawing surface.
pub trait SceneRenderer {
    /// Current drawing area, used for layout.
    fn viewport(&self) -> Viewport;

    /// Draw `frame`, animating entering and exiting elements over `transition`.
    fn draw(&mut self, frame: &Frame, transition: Transition);

    /// Discard the surface and everything on it, and start a fresh one.
    fn recreate_surface(&mut self);

    /// Show a message to the user.
    fn report(&mut self, message: &str) {
        warn!("{}", message);
    }
}

/// Element changes caused by drawing one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDelta {
    pub epoch: usize,
    pub entered_nodes: usize,
    pub updated_nodes: usize,
    pub exited_nodes: usize,
    pub entered_edges: usize,
    pub updated_edges: usize,
    pub exited_edges: usize,
    pub transition: f64,
}

/// Headless retained-mode surface.
#[derive(Debug, Clone)]
pub struct SceneBuffer {
    viewport: Viewport,
    nodes: BTreeMap<NodeKey, NodeShape>,
    edges: BTreeMap<EdgeKey, EdgeShape>,
    deltas: Vec<SceneDelta>,
    drawn: Vec<Frame>,
    messages: Vec<String>,
    generation: u64,
}

impl SceneBuffer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            deltas: Vec::new(),
            drawn: Vec::new(),
            messages: Vec::new(),
            generation: 0,
        }
    }

    /// Change the drawing area; the next frame is laid out for it.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeShape> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeShape> {
        self.edges.values()
    }

    pub fn node(&self, key: NodeKey) -> Option<&NodeShape> {
        self.nodes.get(&key)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeShape> {
        self.edges.get(&key)
    }

    /// One delta per frame drawn on the current surface.
    pub fn deltas(&self) -> &[SceneDelta] {
        &self.deltas
    }

    /// Epochs drawn on the current surface, in order.
    pub fn drawn_epochs(&self) -> Vec<usize> {
        self.deltas.iter().map(|d| d.epoch).collect()
    }

    /// Frames drawn since the last call.
    pub fn take_drawn(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.drawn)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Number of times the surface was recreated.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_blank(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

impl Default for SceneBuffer {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

/// Replace `current` with `incoming`, returning (entered, updated, exited).
fn join<K: Ord + Copy, V>(
    current: &mut BTreeMap<K, V>,
    incoming: impl Iterator<Item = (K, V)>,
) -> (usize, usize, usize) {
    let mut next = BTreeMap::new();
    let (mut entered, mut updated) = (0, 0);
    for (key, value) in incoming {
        if current.contains_key(&key) {
            updated += 1;
        } else {
            entered += 1;
        }
        next.insert(key, value);
    }

    let kept: BTreeSet<K> = next.keys().copied().collect();
    let exited = current.keys().filter(|k| !kept.contains(k)).count();
    *current = next;
    (entered, updated, exited)
}

impl SceneRenderer for SceneBuffer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn draw(&mut self, frame: &Frame, transition: Transition) {
        let (entered_nodes, updated_nodes, exited_nodes) = join(
            &mut self.nodes,
            frame.nodes.iter().map(|n| (n.key(), n.clone())),
        );
        let (entered_edges, updated_edges, exited_edges) = join(
            &mut self.edges,
            frame.edges.iter().map(|e| (e.key(), e.clone())),
        );

        self.deltas.push(SceneDelta {
            epoch: frame.epoch,
            entered_nodes,
            updated_nodes,
            exited_nodes,
            entered_edges,
            updated_edges,
            exited_edges,
            transition: transition.duration,
        });
        self.drawn.push(frame.clone());
    }

    fn recreate_surface(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.deltas.clear();
        self.drawn.clear();
        self.messages.clear();
        self.generation += 1;
    }

    fn report(&mut self, message: &str) {
        warn!("{}", message);
        self.messages.push(message.to_string());
    }
}
