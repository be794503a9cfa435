//! In-memory authoritative view over a store.
//!
//! The UI works against this collection; every mutation updates memory
//! first and then attempts a write-through. A failed write is logged and
//! does not block or roll back the in-memory state; local state stays
//! authoritative until the next successful write.

use super::{ExemptionStore, StoreError};
use crate::models::ExemptionRecord;

pub struct ExemptionLedger<S: ExemptionStore> {
    store: S,
    records: Vec<ExemptionRecord>,
}

impl<S: ExemptionStore> ExemptionLedger<S> {
    /// Load the collection. An unreadable store starts the session empty
    /// rather than refusing to open.
    pub fn load(store: S) -> Self {
        let records = match store.list() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "could not read record store, starting empty");
                Vec::new()
            }
        };
        Self { store, records }
    }

    pub fn records(&self) -> &[ExemptionRecord] {
        &self.records
    }

    /// Replace in place by id, or prepend (newest first).
    pub fn upsert(&mut self, record: ExemptionRecord) {
        if let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
        } else {
            self.records.insert(0, record);
        }
        self.write_through();
    }

    pub fn remove(&mut self, id: &str) {
        self.records.retain(|r| r.id != id);
        self.write_through();
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.write_through();
    }

    /// Retry persisting the current in-memory state.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.store.replace_all(&self.records)
    }

    fn write_through(&self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "storage write failed, keeping in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{sample_record, MemoryStore};

    #[test]
    fn load_picks_up_persisted_records() {
        let store = MemoryStore::new();
        store
            .replace_all(&[sample_record("a", "DURAND")])
            .unwrap();
        let ledger = ExemptionLedger::load(store);
        assert_eq!(ledger.records().len(), 1);
    }

    #[test]
    fn mutations_write_through() {
        let mut ledger = ExemptionLedger::load(MemoryStore::new());
        ledger.upsert(sample_record("a", "DURAND"));
        ledger.upsert(sample_record("b", "MARTIN"));
        ledger.remove("a");
        assert_eq!(ledger.store.list().unwrap().len(), 1);
        assert_eq!(ledger.records().len(), 1);
    }

    #[test]
    fn write_failure_keeps_memory_authoritative() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let mut ledger = ExemptionLedger::load(store);

        ledger.upsert(sample_record("a", "DURAND"));
        assert_eq!(ledger.records().len(), 1);
        // The backing store saw nothing, memory did not roll back.
        assert!(ledger.store.list().unwrap().is_empty());

        // Once writes recover, a flush catches the store up.
        ledger.store.set_fail_writes(false);
        ledger.flush().unwrap();
        assert_eq!(ledger.store.list().unwrap().len(), 1);
    }

    #[test]
    fn upsert_replaces_by_id_in_memory() {
        let mut ledger = ExemptionLedger::load(MemoryStore::new());
        ledger.upsert(sample_record("a", "DURAND"));
        let mut edited = sample_record("a", "DUPONT");
        edited.is_terminale = true;
        ledger.upsert(edited);
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(ledger.records()[0].last_name, "DUPONT");
        assert!(ledger.records()[0].is_terminale);
    }
}
