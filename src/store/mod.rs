//! Persistent exemption collection.
//!
//! The store contract is deliberately whole-collection: `list`,
//! `replace_all`, `clear`, last-writer-wins. Upsert-by-id and delete-by-id
//! are caller-side read-mutate-replace operations; edits are
//! single-session, so no partial-record write protocol is needed.

pub mod json_store;
pub mod ledger;
pub mod migration;

pub use json_store::JsonFileStore;
pub use ledger::ExemptionLedger;
pub use migration::{migrate_legacy, KeyValueStore, MemoryKeyValueStore, LEGACY_KEY};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use crate::models::ExemptionRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Store write error: {0}")]
    Persist(String),
}

/// Whole-collection record store.
pub trait ExemptionStore {
    fn list(&self) -> Result<Vec<ExemptionRecord>, StoreError>;
    fn replace_all(&self, records: &[ExemptionRecord]) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Replace an existing record in place by id, or prepend a new one
/// (newest-first ordering, like the original list).
pub fn upsert(
    store: &dyn ExemptionStore,
    record: ExemptionRecord,
) -> Result<Vec<ExemptionRecord>, StoreError> {
    let mut records = store.list()?;
    if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
        *existing = record;
    } else {
        records.insert(0, record);
    }
    store.replace_all(&records)?;
    Ok(records)
}

/// Delete by id. Unknown ids are a no-op.
pub fn remove(
    store: &dyn ExemptionStore,
    id: &str,
) -> Result<Vec<ExemptionRecord>, StoreError> {
    let mut records = store.list()?;
    records.retain(|r| r.id != id);
    store.replace_all(&records)?;
    Ok(records)
}

/// In-memory store for tests, with a toggle to make writes fail.
pub struct MemoryStore {
    records: Mutex<Vec<ExemptionRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExemptionStore for MemoryStore {
    fn list(&self) -> Result<Vec<ExemptionRecord>, StoreError> {
        Ok(self.records.lock().expect("store poisoned").clone())
    }

    fn replace_all(&self, records: &[ExemptionRecord]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Persist("simulated write failure".into()));
        }
        *self.records.lock().expect("store poisoned") = records.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.replace_all(&[])
    }
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str, last_name: &str) -> ExemptionRecord {
    use chrono::NaiveDate;
    let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    ExemptionRecord {
        id: id.to_string(),
        last_name: last_name.to_string(),
        first_name: "Marie".into(),
        student_class: "602".into(),
        received_at: day,
        start_date: day,
        end_date: crate::dates::derive_end(day, 5),
        duration_days: 5,
        photo_base64: None,
        is_parental_note: false,
        is_terminale: false,
    }
}
