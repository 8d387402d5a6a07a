//! Abstraction over the outbound notification channel.
//!
//! Delivery is one-shot and best-effort: a failed send is logged by the
//! caller and never retried, because the dedup ledger has already marked the
//! item as seen (at-most-once, not at-least-once).
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for errors returned by messenger implementations.
pub trait MessengerError: Debug + Error + Send + Sync + 'static {}

/// A sink delivering rendered notifications to a messaging channel.
///
/// Captions arrive already escaped for the channel's markup dialect; length
/// and markup limits are the channel's concern, not validated here.
#[async_trait]
pub trait Messenger: Send + Sync + 'static {
    /// The error type returned by delivery operations.
    type Error: MessengerError;

    /// Delivers a text-only message.
    async fn send_text(&self, text: &str) -> Result<(), Self::Error>;

    /// Delivers an image with a caption.
    async fn send_photo(&self, photo: Bytes, caption: &str) -> Result<(), Self::Error>;
}
