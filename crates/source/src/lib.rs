//! Abstraction over the library server's real-time update feed.
//!
//! Concrete implementations (GraphQL over WebSocket) live in separate crates.
//! The trait deliberately exposes failure classification: whether an error is
//! an authorization failure is decided once, at the transport boundary, so
//! callers never have to inspect error payloads themselves.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod event;

pub use event::{Chapter, RawUpdateEvent, Series, SourceInfo, UpdateBatch};

use std::error::Error;
use std::fmt::Debug;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

/// Errors returned by update sources.
pub trait SourceError: Debug + Error + Send + Sync + 'static {
    /// Whether this error indicates the server rejected our credentials.
    /// Callers use this to invalidate the session before reconnecting.
    fn is_unauthorized(&self) -> bool;
}

/// A stream of update batches. Ends when the subscription closes normally;
/// yields an `Err` item (then ends) when it fails.
pub type UpdateStream<E> = Pin<Box<dyn Stream<Item = Result<UpdateBatch, E>> + Send>>;

/// A long-lived subscription to the server's "library updated" feed.
#[async_trait]
pub trait UpdateSource: Send + Sync + 'static {
    /// The error type returned by this source.
    type Error: SourceError;

    /// Opens a subscription, attaching the bearer token to the handshake when
    /// one is present. Returns a stream of event batches.
    async fn subscribe(
        &self,
        bearer_token: Option<&str>,
    ) -> Result<UpdateStream<Self::Error>, Self::Error>;
}
