//! Load-once dataset cache.
//!
//! Holds a single entry keyed by source identity. A request for the same
//! source returns the cached dataset; a different source replaces it.

use super::loader::{load_records, DataSource, Dataset, LoadOptions, SourceId};
use crate::error::DataLoadError;
use std::sync::Arc;
use tracing::{debug, info};

/// Single-entry cache of the most recently loaded dataset.
#[derive(Debug, Default)]
pub struct DatasetCache {
    options: LoadOptions,
    entry: Option<(SourceId, Arc<Dataset>)>,
}

impl DatasetCache {
    /// Create an empty cache that loads with `options`.
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            entry: None,
        }
    }

    /// Return the cached dataset for `source`, loading it on a miss.
    pub fn get_or_load(&mut self, source: &DataSource) -> Result<Arc<Dataset>, DataLoadError> {
        let id = source.identity();

        if let Some((cached_id, dataset)) = &self.entry {
            if *cached_id == id {
                debug!("Dataset cache hit for {}", source.name());
                return Ok(Arc::clone(dataset));
            }
        }

        self.load(source, id)
    }

    /// Load `source` unconditionally and replace the cached entry.
    pub fn reload(&mut self, source: &DataSource) -> Result<Arc<Dataset>, DataLoadError> {
        info!("Reloading dataset from {}", source.name());
        let id = source.identity();
        self.load(source, id)
    }

    /// Whether `source` is the cached entry.
    pub fn contains(&self, source: &DataSource) -> bool {
        matches!(&self.entry, Some((id, _)) if *id == source.identity())
    }

    /// Drop the cached entry.
    pub fn clear(&mut self) {
        self.entry = None;
    }

    fn load(&mut self, source: &DataSource, id: SourceId) -> Result<Arc<Dataset>, DataLoadError> {
        let dataset = Arc::new(load_records(source, &self.options)?);
        self.entry = Some((id, Arc::clone(&dataset)));
        Ok(dataset)
    }
}
