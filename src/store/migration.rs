//! One-shot migration of the legacy single-blob record list.
//!
//! Early installations kept the whole collection as one JSON string under
//! a key-value entry. On first run the blob is parsed, written into the
//! record store, and the legacy entry removed. One-time, one-directional,
//! no rollback. A second run finds no entry and does nothing, so records
//! are never duplicated.

use std::collections::HashMap;

use super::{ExemptionStore, StoreError};
use crate::models::ExemptionRecord;

/// Key the legacy app stored its collection under.
pub const LEGACY_KEY: &str = "eps-inaptitudes";

/// Minimal key-value collaborator holding the legacy blob.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// Run the migration boundary. Returns how many records were migrated
/// (zero when there is nothing to do).
///
/// An unparseable blob is dropped with a warning: there is no older
/// format to fall back to, and keeping it would re-fail every launch. A
/// store write failure leaves the legacy entry in place so the next run
/// can retry.
pub fn migrate_legacy(
    kv: &mut dyn KeyValueStore,
    store: &dyn ExemptionStore,
) -> Result<usize, StoreError> {
    let Some(blob) = kv.get(LEGACY_KEY) else {
        return Ok(0);
    };

    match serde_json::from_str::<Vec<ExemptionRecord>>(&blob) {
        Ok(records) => {
            store.replace_all(&records)?;
            kv.remove(LEGACY_KEY);
            tracing::info!(count = records.len(), "legacy records migrated");
            Ok(records.len())
        }
        Err(e) => {
            tracing::warn!(error = %e, "legacy blob unparseable, dropping it");
            kv.remove(LEGACY_KEY);
            Ok(0)
        }
    }
}

/// In-memory key-value store (tests and defaults).
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut kv = Self::new();
        kv.set(key, value);
        kv
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
