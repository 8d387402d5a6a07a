//! Key-value storage backed by files on disk. Used for the watcher's state
//! snapshot so it survives restarts.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use herald_store::Store;
use tokio::fs;
use tokio::io::{self, AsyncWriteExt};

/// KV store keeping one file per key under a directory.
#[derive(Clone, Debug)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Creates a new `FsStore` rooted at the specified directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl Store for FsStore {
    type Error = Error;

    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error> {
        let path = self.file_path(&key.into());
        match fs::read(path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io("error reading file", e)),
        }
    }

    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error> {
        let path = self.file_path(&key.into());
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::Io("error creating directory", e))?;
            }
        }
        let mut file = fs::File::create(path)
            .await
            .map_err(|e| Error::Io("error creating file", e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| Error::Io("error writing file", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path().to_path_buf());

        let key = "state.json".to_string();
        let value = Bytes::from_static(b"{\"lastSeen\":{}}");

        store.put(key.clone(), value.clone()).await.unwrap();
        let result = store.get(key).await.unwrap();

        assert_eq!(result, Some(value));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path().to_path_buf());

        let result = store.get("missing.json").await.unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path().to_path_buf());

        store
            .put("state.json", Bytes::from_static(b"first"))
            .await
            .unwrap();
        store
            .put("state.json", Bytes::from_static(b"second"))
            .await
            .unwrap();
        let result = store.get("state.json").await.unwrap();

        assert_eq!(result, Some(Bytes::from_static(b"second")));
    }

    #[tokio::test]
    async fn test_put_creates_directories() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path().join("nested").join("state"));

        let value = Bytes::from_static(b"test_value");

        store.put("state.json", value.clone()).await.unwrap();
        let result = store.get("state.json").await.unwrap();

        assert_eq!(result, Some(value));
    }
}
