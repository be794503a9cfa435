//! JSON-file record store.
//!
//! One JSON array per installation. `replace_all` writes through a named
//! temp file in the same directory and renames it over the target, so a
//! crash mid-write never leaves a truncated collection behind.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{ExemptionStore, StoreError};
use crate::config;
use crate::models::ExemptionRecord;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the standard per-user location.
    pub fn default_location() -> Self {
        Self::new(config::records_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExemptionStore for JsonFileStore {
    fn list(&self) -> Result<Vec<ExemptionRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn replace_all(&self, records: &[ExemptionRecord]) -> Result<(), StoreError> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut tmp, records)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Persist(e.to_string()))?;

        tracing::debug!(count = records.len(), path = %self.path.display(), "collection written");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.replace_all(&[])
    }
}
