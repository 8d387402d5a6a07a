//! In-memory implementation of key-value storage for tests and local
//! development. Tracks how many writes were performed so tests can assert
//! that a no-op batch persists nothing.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use herald_store::Store;
use tokio::sync::Mutex;

/// In-memory key-value store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    map: Arc<Mutex<HashMap<String, Bytes>>>,
    writes: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Creates a new `MemoryStore`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls performed since creation.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Error = Error;

    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error> {
        let map = self.map.lock().await;
        Ok(map.get(&key.into()).cloned())
    }

    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error> {
        self.map.lock().await.insert(key.into(), bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();

        let value = Bytes::from_static(b"test_value");
        store.put("test_key", value.clone()).await.unwrap();
        let result = store.get("test_key").await.unwrap();

        assert_eq!(result, Some(value));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let store = MemoryStore::new();

        let result = store.get("nonexistent_key").await.unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_write_count() {
        let store = MemoryStore::new();
        assert_eq!(store.write_count(), 0);

        store
            .put("test_key", Bytes::from_static(b"a"))
            .await
            .unwrap();
        store
            .put("test_key", Bytes::from_static(b"b"))
            .await
            .unwrap();
        let _ = store.get("test_key").await.unwrap();

        assert_eq!(store.write_count(), 2);
    }
}
