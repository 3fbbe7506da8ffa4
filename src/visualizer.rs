//! The control surface hosts talk to.
//!
//! A host selects a document with [`Visualizer::set_topology_source`],
//! starts and stops runs, and drives time with [`Visualizer::advance`].
//! Everything else (fetching, diffing, scheduling, drawing) happens behind
//! these calls.
//!
//! # Example
//!
//! ```
//! use weightscope::{
//!     InMemorySource, SceneBuffer, Topology, TrainingResult, Visualizer, VisualizerConfig,
//! };
//!
//! # fn main() -> weightscope::Result<()> {
//! let topology = Topology::parse("MLP[4,3].json")?;
//! let mut source = InMemorySource::new();
//! source.insert("MLP[4,3].json", TrainingResult::synthetic(&topology, 6, 5, 42)?);
//!
//! let mut viz = Visualizer::new(VisualizerConfig::default(), source, SceneBuffer::default())?;
//! viz.set_topology_source("MLP[4,3].json")?;
//! viz.start()?;
//! assert_eq!(viz.run_to_completion()?, 5);
//! assert_eq!(viz.renderer().drawn_epochs(), vec![0, 1, 2, 3, 4]);
//! # Ok(())
//! # }
//! ```

use crate::config::VisualizerConfig;
use crate::scene::SceneRenderer;
use crate::scheduler::{AnimationScheduler, Completion, SchedulerStatus, TaskHandle};
use crate::session::VisualizationSession;
use crate::source::ResultSource;
use crate::{Result, Topology, VizError};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Options pushed by the host shell: the selected file and whether to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VizOptions {
    pub selected_file: Option<String>,
    pub is_running: bool,
}

/// Fetches, computes and animates training results for a host.
pub struct Visualizer<S: ResultSource, R: SceneRenderer> {
    config: VisualizerConfig,
    source: S,
    scheduler: AnimationScheduler<R>,
    selected_file: Option<String>,
    topology: Option<Topology>,
}

impl<S: ResultSource, R: SceneRenderer> Visualizer<S, R> {
    pub fn new(config: VisualizerConfig, source: S, renderer: R) -> Result<Self> {
        let scheduler = AnimationScheduler::new(renderer, &config)?;
        Ok(Self {
            config,
            source,
            scheduler,
            selected_file: None,
            topology: None,
        })
    }

    /// Select the document to visualize and derive its topology.
    ///
    /// Any active run is reset. On a parse error no topology is selected.
    pub fn set_topology_source(&mut self, filename: &str) -> Result<&Topology> {
        self.scheduler.reset();
        self.selected_file = Some(filename.to_string());
        self.topology = None;

        let topology = Topology::parse(filename).map_err(|e| {
            warn!("{}", e);
            e
        })?;
        info!("selected {} ({})", filename, topology);
        Ok(self.topology.insert(topology))
    }

    /// Fetch the selected document and start animating it.
    ///
    /// The document is fetched and diffed before the surface is touched, so
    /// a failure leaves whatever was drawn before on screen.
    pub fn start(&mut self) -> Result<Vec<TaskHandle>> {
        let (Some(filename), Some(topology)) = (self.selected_file.as_deref(), self.topology.as_ref())
        else {
            return Err(VizError::NoTopology);
        };

        self.scheduler.stop();
        let doc = self.source.fetch(filename)?;
        let session = VisualizationSession::compute(
            topology.clone(),
            self.scheduler.renderer().viewport(),
            &doc,
            self.config.output_layer_policy,
        )
        .map_err(|e| {
            warn!("run aborted: {}", e);
            e
        })?;

        self.scheduler.reset();
        self.scheduler.start(session)
    }

    /// Cancel pending frames; what is drawn stays drawn.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Cancel pending frames and clear the surface.
    pub fn reset(&mut self) {
        self.scheduler.reset();
    }

    /// Register the completion listener.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(Completion) + 'static,
    {
        self.scheduler.set_on_complete(callback);
    }

    /// Move virtual time forward; returns the number of frames drawn.
    pub fn advance(&mut self, dt: f64) -> Result<usize> {
        self.scheduler.advance(dt)
    }

    pub fn run_to_completion(&mut self) -> Result<usize> {
        self.scheduler.run_to_completion()
    }

    /// Apply options from the host shell.
    ///
    /// A changed file is selected first; then a running flag starts a fresh
    /// run and a cleared flag resets.
    pub fn apply_options(&mut self, options: &VizOptions) -> Result<()> {
        if let Some(file) = options.selected_file.as_deref() {
            if self.selected_file.as_deref() != Some(file) {
                self.set_topology_source(file)?;
            }
        }

        if options.is_running {
            self.start()?;
        } else {
            self.reset();
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.status() == SchedulerStatus::Running
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source, e.g. to register documents.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &AnimationScheduler<R> {
        &self.scheduler
    }

    pub fn renderer(&self) -> &R {
        self.scheduler.renderer()
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        self.scheduler.renderer_mut()
    }
}
