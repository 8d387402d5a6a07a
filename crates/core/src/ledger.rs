//! The persisted dedup ledger: maps every series ever observed to the last
//! chapter version seen for it. Entries are never deleted.

use std::collections::HashMap;

use bytes::Bytes;
use herald_store::Store;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PersistenceError;

/// The store key the ledger snapshot is persisted under.
pub const STATE_KEY: &str = "state.json";

/// Outcome of checking one series/version pair against the ledger.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Classification {
    /// First-ever observation of this series: recorded, never notified.
    /// Seeding on first observation is what prevents replaying the whole
    /// library as "new" on a fresh state file.
    Baseline,
    /// The stored version string equals the observed one; no mutation.
    Unchanged,
    /// The version string changed; the stored entry was overwritten.
    New,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Snapshot {
    #[serde(default, rename = "lastSeen")]
    last_seen: HashMap<String, String>,
}

/// Dedup ledger backed by a key-value store.
#[derive(Debug)]
pub struct Ledger<S: Store> {
    store: S,
    last_seen: HashMap<String, String>,
    dirty: bool,
}

impl<S: Store> Ledger<S> {
    /// Creates an empty ledger over the given store. State is picked up by
    /// the first `reload`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            last_seen: HashMap::new(),
            dirty: false,
        }
    }

    /// Re-reads the persisted snapshot. A missing snapshot keeps the current
    /// in-memory map; an unreadable or corrupt one resets to empty (which
    /// replays the library as baseline, suppressing notifications for one
    /// cycle rather than storming).
    pub async fn reload(&mut self) {
        match self.store.get(STATE_KEY).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Snapshot>(&bytes) {
                Ok(snapshot) => {
                    self.last_seen = snapshot.last_seen;
                    self.dirty = false;
                }
                Err(e) => {
                    warn!("state snapshot is corrupt, starting from empty: {e}");
                    self.last_seen = HashMap::new();
                    self.dirty = false;
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!("could not read state snapshot, starting from empty: {e}");
                self.last_seen = HashMap::new();
                self.dirty = false;
            }
        }
    }

    /// Checks a series/version pair against the ledger, recording it when it
    /// is new to us. Versions are opaque strings; a renumbered (even
    /// decreased) chapter classifies as `New`.
    pub fn classify(&mut self, item_id: &str, version: &str) -> Classification {
        match self.last_seen.get(item_id) {
            None => {
                self.last_seen
                    .insert(item_id.to_string(), version.to_string());
                self.dirty = true;
                Classification::Baseline
            }
            Some(prev) if prev == version => Classification::Unchanged,
            Some(_) => {
                self.last_seen
                    .insert(item_id.to_string(), version.to_string());
                self.dirty = true;
                Classification::New
            }
        }
    }

    /// Persists the snapshot if and only if a classification mutated it since
    /// the last flush. Returns whether a write was performed. Must run before
    /// any notification for the batch is delivered, so a crash between flush
    /// and delivery loses at most one notification and never re-delivers.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails; the
    /// in-memory map stays authoritative either way.
    pub async fn flush_if_dirty(&mut self) -> Result<bool, PersistenceError> {
        if !self.dirty {
            return Ok(false);
        }

        let snapshot = Snapshot {
            last_seen: self.last_seen.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot).map_err(PersistenceError::Serialize)?;

        self.store
            .put(STATE_KEY, Bytes::from(bytes))
            .await
            .map_err(|e| PersistenceError::Store(Box::new(e)))?;

        self.dirty = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use herald_store_memory::MemoryStore;

    #[tokio::test]
    async fn test_baseline_then_unchanged() {
        let mut ledger = Ledger::new(MemoryStore::new());

        assert_eq!(ledger.classify("1", "10"), Classification::Baseline);
        assert_eq!(ledger.classify("1", "10"), Classification::Unchanged);
    }

    #[tokio::test]
    async fn test_new_exactly_once() {
        let mut ledger = Ledger::new(MemoryStore::new());

        ledger.classify("1", "10");
        assert_eq!(ledger.classify("1", "11"), Classification::New);
        assert_eq!(ledger.classify("1", "11"), Classification::Unchanged);
    }

    #[tokio::test]
    async fn test_version_strings_are_opaque() {
        let mut ledger = Ledger::new(MemoryStore::new());

        ledger.classify("1", "11");
        // A decrease is still a change: no numeric ordering is assumed.
        assert_eq!(ledger.classify("1", "10"), Classification::New);
    }

    #[tokio::test]
    async fn test_flush_writes_only_when_dirty() {
        let store = MemoryStore::new();
        let mut ledger = Ledger::new(store.clone());

        assert!(!ledger.flush_if_dirty().await.unwrap());
        assert_eq!(store.write_count(), 0);

        ledger.classify("1", "10");
        assert!(ledger.flush_if_dirty().await.unwrap());
        assert_eq!(store.write_count(), 1);

        // Unchanged classification leaves the ledger clean.
        ledger.classify("1", "10");
        assert!(!ledger.flush_if_dirty().await.unwrap());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_reload_round_trip() {
        let store = MemoryStore::new();

        let mut ledger = Ledger::new(store.clone());
        ledger.classify("1", "10");
        ledger.flush_if_dirty().await.unwrap();

        let mut restored = Ledger::new(store);
        restored.reload().await;
        assert_eq!(restored.classify("1", "10"), Classification::Unchanged);
        assert_eq!(restored.classify("1", "11"), Classification::New);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_resets_to_empty() {
        let store = MemoryStore::new();
        store
            .put(STATE_KEY, Bytes::from_static(b"not json"))
            .await
            .unwrap();

        let mut ledger = Ledger::new(store);
        ledger.reload().await;

        // Everything replays as baseline after a corrupt snapshot.
        assert_eq!(ledger.classify("1", "10"), Classification::Baseline);
    }

    #[tokio::test]
    async fn test_missing_snapshot_keeps_memory_state() {
        let mut ledger = Ledger::new(MemoryStore::new());

        ledger.classify("1", "10");
        ledger.reload().await;

        // Nothing persisted yet, so the in-memory entry survives the reload.
        assert_eq!(ledger.classify("1", "10"), Classification::Unchanged);
    }

    #[tokio::test]
    async fn test_snapshot_shape() {
        let store = MemoryStore::new();
        let mut ledger = Ledger::new(store.clone());

        ledger.classify("42", "12.5");
        ledger.flush_if_dirty().await.unwrap();

        let bytes = store.get(STATE_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["lastSeen"]["42"], "12.5");
    }
}
