//! Where training result documents come from.
//!
//! The engine only needs "give me the document called X"; transport is up
//! to the host. [`AssetDirectory`] serves files from disk and
//! [`InMemorySource`] serves documents the host registered up front (the
//! WASM binding fills one from `fetch` responses).

use crate::config::VisualizerConfig;
use crate::training_result::TrainingResult;
use crate::{Result, VizError};
use log::debug;
use std::collections::HashMap;
use std::path::PathBuf;

/// Retrieves a training result document by filename.
pub trait ResultSource {
    fn fetch(&self, filename: &str) -> Result<TrainingResult>;
}

/// Reads `<base>/<filename>` from the local filesystem.
#[derive(Debug, Clone)]
pub struct AssetDirectory {
    base: PathBuf,
}

impl AssetDirectory {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Serve from the configured `asset_base_path`.
    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self::new(&config.asset_base_path)
    }

    pub fn base(&self) -> &std::path::Path {
        &self.base
    }
}

impl ResultSource for AssetDirectory {
    fn fetch(&self, filename: &str) -> Result<TrainingResult> {
        let path = self.base.join(filename);
        debug!("fetching {}", path.display());
        let json = std::fs::read_to_string(&path)?;
        TrainingResult::from_json(&json)
    }
}

/// Documents registered by filename.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: HashMap<String, TrainingResult>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, filename: impl Into<String>, doc: TrainingResult) {
        self.documents.insert(filename.into(), doc);
    }

    /// Parse and register a JSON document.
    pub fn insert_json(&mut self, filename: impl Into<String>, json: &str) -> Result<()> {
        let doc = TrainingResult::from_json(json)?;
        self.insert(filename, doc);
        Ok(())
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.documents.contains_key(filename)
    }
}

impl ResultSource for InMemorySource {
    fn fetch(&self, filename: &str) -> Result<TrainingResult> {
        self.documents.get(filename).cloned().ok_or_else(|| {
            VizError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no training result named '{}'", filename),
            ))
        })
    }
}
