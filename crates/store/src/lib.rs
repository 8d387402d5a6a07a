//! Key-value storage abstraction used for durable watcher state.
//!
//! Concrete backends (filesystem, in-memory) live in separate crates.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for errors returned by store implementations.
pub trait StoreError: Debug + Error + Send + Sync + 'static {}

/// A key-value store with asynchronous operations.
///
/// A missing key is not an error: `get` returns `Ok(None)`. `put` replaces
/// any previous value wholesale.
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    /// The error type returned by store operations.
    type Error: StoreError;

    /// Retrieves the value stored under a key, if any.
    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error>;

    /// Stores a value under a key, replacing any existing value.
    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error>;
}
