//! Frame scheduling on a virtual timeline.
//!
//! Starting a run schedules one emission per epoch at `epoch * interval` on
//! a [`Timeline`]. The host drives time forward with
//! [`AnimationScheduler::advance`]; every emission that falls due builds its
//! epoch's frame and hands it to the renderer. The last emission signals
//! completion.
//!
//! Cancelling removes emissions from the timeline, so a cancelled emission
//! can never fire. `reset()` cancels everything and replaces the surface, so
//! at most one animation is ever active.
//!
//! ```text
//! Idle --start--> Running --last frame--> Idle
//!                    |
//!                    +--stop--> Cancelled --reset--> Idle
//! ```

use crate::config::VisualizerConfig;
use crate::frame_builder::FrameBuilder;
use crate::scene::{SceneRenderer, Transition};
use crate::session::VisualizationSession;
use crate::{Result, VizError};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

/// User-visible message shown when frame and range data disagree.
pub const CONSISTENCY_DIAGNOSTIC: &str =
    "Unable to visualize this training result: weight frames and range data are out of sync.";

/// Identifies a scheduled emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

/// An emission scheduled on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub handle: TaskHandle,
    /// Virtual time the emission falls due
    pub due: f64,
    /// Epoch captured when the emission was scheduled
    pub epoch: usize,
}

/// Monotonic virtual clock with cancellable emissions.
///
/// Emissions fall due in (due time, schedule order) order.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    now: f64,
    next_handle: u64,
    pending: Vec<Emission>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Schedule `epoch` to fall due `delay` units from now.
    pub fn schedule(&mut self, delay: f64, epoch: usize) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;

        let emission = Emission {
            handle,
            due: self.now + delay.max(0.0),
            epoch,
        };
        // handles grow monotonically, so ties keep schedule order
        let pos = self.pending.partition_point(|e| e.due <= emission.due);
        self.pending.insert(pos, emission);
        handle
    }

    /// Remove an emission. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.pending.iter().position(|e| e.handle == handle) {
            Some(pos) => {
                self.pending.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of emissions still scheduled.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Due time of the next emission.
    pub fn next_due(&self) -> Option<f64> {
        self.pending.first().map(|e| e.due)
    }

    /// Move the clock forward by `dt`.
    pub fn advance_clock(&mut self, dt: f64) {
        if dt > 0.0 {
            self.now += dt;
        }
    }

    /// Take the earliest emission that is due, if any.
    pub fn pop_due(&mut self) -> Option<Emission> {
        if self.pending.first()?.due <= self.now {
            Some(self.pending.remove(0))
        } else {
            None
        }
    }
}

/// Lifecycle of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerStatus {
    Idle,
    Running,
    Cancelled,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// The final epoch was emitted
    EndOfVisualization { frames: usize },
    /// The run was abandoned before its final epoch
    Aborted,
}

/// Pending emissions, current epoch and status of the active run.
#[derive(Debug, Clone)]
pub struct AnimationState {
    handles: Vec<TaskHandle>,
    current_epoch: Option<usize>,
    status: SchedulerStatus,
}

impl AnimationState {
    fn new() -> Self {
        Self {
            handles: Vec::new(),
            current_epoch: None,
            status: SchedulerStatus::Idle,
        }
    }

    pub fn handles(&self) -> &[TaskHandle] {
        &self.handles
    }

    pub fn current_epoch(&self) -> Option<usize> {
        self.current_epoch
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status
    }
}

type CompletionCallback = Box<dyn FnMut(Completion)>;

/// Emits one frame per epoch to a renderer at fixed intervals.
pub struct AnimationScheduler<R: SceneRenderer> {
    renderer: R,
    frame_interval: f64,
    transition: Transition,
    builder: FrameBuilder,
    timeline: Timeline,
    state: AnimationState,
    session: Option<VisualizationSession>,
    on_complete: Option<CompletionCallback>,
    frames_emitted: usize,
}

impl<R: SceneRenderer> AnimationScheduler<R> {
    /// Create an idle scheduler drawing onto `renderer`.
    pub fn new(renderer: R, config: &VisualizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            renderer,
            frame_interval: config.frame_interval,
            transition: Transition {
                duration: config.transition_duration,
            },
            builder: FrameBuilder::new(config.node_radius),
            timeline: Timeline::new(),
            state: AnimationState::new(),
            session: None,
            on_complete: None,
            frames_emitted: 0,
        })
    }

    /// Register the completion listener, replacing any previous one.
    pub fn set_on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(Completion) + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// Schedule every epoch of `session`, returning the emission handles.
    ///
    /// Only valid while idle; call [`reset`](Self::reset) first. If the
    /// session's weight and range sets disagree, the run is aborted before
    /// any frame is scheduled: the renderer shows [`CONSISTENCY_DIAGNOSTIC`]
    /// and completion is signalled.
    pub fn start(&mut self, session: VisualizationSession) -> Result<Vec<TaskHandle>> {
        if self.state.status != SchedulerStatus::Idle {
            return Err(VizError::Busy);
        }

        let series = session.series();
        if !series.is_consistent() {
            warn!(
                "aborting run: {} weight sets but {} range sets",
                series.weights.len(),
                series.ranges.len()
            );
            self.renderer.report(CONSISTENCY_DIAGNOSTIC);
            self.complete(Completion::Aborted);
            return Err(VizError::Consistency(CONSISTENCY_DIAGNOSTIC.to_string()));
        }

        let epochs = session.num_epochs();
        info!(
            "starting {} over {} epochs, {} units apart",
            session.topology(),
            epochs,
            self.frame_interval
        );

        self.frames_emitted = 0;
        self.state.current_epoch = None;
        if epochs == 0 {
            self.complete(Completion::EndOfVisualization { frames: 0 });
            return Ok(Vec::new());
        }

        for epoch in 0..epochs {
            let handle = self
                .timeline
                .schedule(epoch as f64 * self.frame_interval, epoch);
            self.state.handles.push(handle);
        }
        self.session = Some(session);
        self.state.status = SchedulerStatus::Running;
        Ok(self.state.handles.clone())
    }

    /// Move virtual time forward by `dt`, emitting every frame that falls due.
    ///
    /// Returns the number of frames emitted.
    pub fn advance(&mut self, dt: f64) -> Result<usize> {
        self.timeline.advance_clock(dt);
        let mut emitted = 0;
        while let Some(emission) = self.timeline.pop_due() {
            self.emit(emission)?;
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Drive the timeline until the run is no longer active.
    pub fn run_to_completion(&mut self) -> Result<usize> {
        let mut emitted = 0;
        while self.state.status == SchedulerStatus::Running {
            let Some(due) = self.timeline.next_due() else {
                break;
            };
            emitted += self.advance(due - self.timeline.now())?;
        }
        Ok(emitted)
    }

    fn emit(&mut self, emission: Emission) -> Result<()> {
        self.state.handles.retain(|&h| h != emission.handle);

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        session.relayout(self.renderer.viewport());
        let last = session.num_epochs() - 1;
        let frame = match self.builder.build(session, emission.epoch) {
            Ok(frame) => frame,
            Err(e) => {
                error!("cannot build frame for epoch {}: {}", emission.epoch, e);
                self.cancel_pending();
                self.state.status = SchedulerStatus::Idle;
                self.complete(Completion::Aborted);
                return Err(e);
            }
        };

        debug!(
            "epoch {} at t={}: {} nodes, {} edges",
            emission.epoch,
            self.timeline.now(),
            frame.nodes.len(),
            frame.edges.len()
        );
        self.renderer.draw(&frame, self.transition);
        self.state.current_epoch = Some(emission.epoch);
        self.frames_emitted += 1;

        if emission.epoch == last {
            self.state.status = SchedulerStatus::Idle;
            self.complete(Completion::EndOfVisualization {
                frames: self.frames_emitted,
            });
        }
        Ok(())
    }

    /// Cancel pending emissions, leaving the surface as it is.
    pub fn stop(&mut self) {
        let cancelled = self.cancel_pending();
        if self.state.status == SchedulerStatus::Running {
            info!("stopped with {} frames pending", cancelled);
            self.state.status = SchedulerStatus::Cancelled;
        }
    }

    /// Cancel everything, clear activity state and start a fresh surface.
    pub fn reset(&mut self) {
        let cancelled = self.cancel_pending();
        if let Some(session) = self.session.as_mut() {
            session.clear_activities();
        }
        self.session = None;
        self.state.current_epoch = None;
        self.state.status = SchedulerStatus::Idle;
        self.frames_emitted = 0;
        self.renderer.recreate_surface();
        info!("reset ({} pending emissions cancelled)", cancelled);
    }

    fn cancel_pending(&mut self) -> usize {
        let handles = std::mem::take(&mut self.state.handles);
        handles
            .into_iter()
            .filter(|&h| self.timeline.cancel(h))
            .count()
    }

    fn complete(&mut self, completion: Completion) {
        info!("visualization complete: {:?}", completion);
        if let Some(callback) = self.on_complete.as_mut() {
            callback(completion);
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.state.status
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Emissions still scheduled.
    pub fn pending(&self) -> usize {
        self.timeline.pending()
    }

    pub fn now(&self) -> f64 {
        self.timeline.now()
    }

    pub fn session(&self) -> Option<&VisualizationSession> {
        self.session.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
