//! Error types for the Weightscope engine.
//!
//! This module provides a unified error type for every stage of the
//! visualization pipeline, using the `thiserror` crate for ergonomic error
//! handling. All variants are fatal to the current run only: the host stays
//! usable and a new run can be started right after a `reset()`.

use thiserror::Error;

/// The main error type for Weightscope operations.
#[derive(Error, Debug)]
pub enum VizError {
    /// The filename does not encode a valid topology
    #[error("Topology parse error in '{filename}': {reason}")]
    Parse {
        /// Filename that was parsed
        filename: String,
        /// What was wrong with it
        reason: String,
    },

    /// Weight data is structurally inconsistent across epochs
    #[error("Weight computation error at epoch {epoch}: {reason}")]
    Computation {
        /// Epoch being diffed when the mismatch was found
        epoch: usize,
        /// Description of the mismatch
        reason: String,
    },

    /// Frame and range sets disagree; carries the user-visible diagnostic
    #[error("{0}")]
    Consistency(String),

    /// The training result document failed structural parsing
    #[error("Invalid training result document: {0}")]
    InvalidDocument(String),

    /// Requested epoch does not exist in the session
    #[error("Epoch {epoch} out of range ({epochs} epochs)")]
    EpochOutOfRange {
        /// Requested epoch
        epoch: usize,
        /// Number of epochs available
        epochs: usize,
    },

    /// An animation is already active
    #[error("Animation already active - call reset() before start()")]
    Busy,

    /// `start()` was called before a topology source was selected
    #[error("No topology source selected")]
    NoTopology,

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error occurred
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VizError {
    /// Build a [`VizError::Parse`] for `filename`.
    pub(crate) fn parse(filename: &str, reason: impl Into<String>) -> Self {
        VizError::Parse {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a [`VizError::Computation`] for `epoch`.
    pub(crate) fn computation(epoch: usize, reason: impl Into<String>) -> Self {
        VizError::Computation {
            epoch,
            reason: reason.into(),
        }
    }

    /// Whether the error ended, or prevented, the run it was raised for.
    ///
    /// `Busy` is the one exception: the rejected `start()` leaves the active
    /// animation running. No error is fatal to the host.
    pub fn is_run_fatal(&self) -> bool {
        !matches!(self, VizError::Busy)
    }
}

/// A specialized `Result` type for Weightscope operations.
pub type Result<T> = std::result::Result<T, VizError>;
