//! The stateful update-detection and session-resilience pipeline: dedup
//! ledger, batch dispatcher, caption rendering, and the subscription
//! supervisor that ties them to the source, session, and messenger seams.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod dispatch;
mod error;
mod ledger;
mod media;
mod render;
mod watcher;

pub use dispatch::{Dispatcher, Notification};
pub use error::PersistenceError;
pub use ledger::{Classification, Ledger, STATE_KEY};
pub use media::MediaFetcher;
pub use render::{RenderedNotification, escape_markdown, format_upload_date, render};
pub use watcher::{DEFAULT_BACKOFF, Watcher, WatcherOptions};
