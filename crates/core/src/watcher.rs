//! The session-resilient subscription supervisor.
//!
//! Runs the `Connecting → Subscribed → Backoff → Connecting` cycle forever:
//! opens a subscription with the current credential, routes batches through
//! the dispatcher, delivers notifications sequentially in batch order, and on
//! any failure or close backs off, refreshes the credential, and reconnects.
//! There is no terminal success state; only cancellation stops the loop.

use std::time::Duration;

use futures::StreamExt;
use herald_messenger::Messenger;
use herald_session::{Authenticator, Session};
use herald_source::{SourceError, UpdateSource};
use herald_store::Store;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatch::{Dispatcher, Notification};
use crate::media::MediaFetcher;
use crate::render::render;

/// Delay between a subscription ending (for any reason) and the next
/// connection attempt.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Everything a watcher needs to run.
pub struct WatcherOptions<A, U, M, S> {
    /// Refreshes the bearer token.
    pub authenticator: A,
    /// The subscription to supervise.
    pub source: U,
    /// The delivery sink.
    pub messenger: M,
    /// Durable storage for the dedup ledger.
    pub store: S,
    /// The shared bearer-token session.
    pub session: Session,
    /// Thumbnail retrieval.
    pub media: MediaFetcher,
    /// Delay before reconnecting.
    pub backoff: Duration,
}

/// Supervises one subscription at a time and pushes new-content
/// notifications to the messenger.
pub struct Watcher<A, U, M, S: Store> {
    authenticator: A,
    source: U,
    messenger: M,
    session: Session,
    dispatcher: Dispatcher<S>,
    media: MediaFetcher,
    backoff: Duration,
}

impl<A, U, M, S> Watcher<A, U, M, S>
where
    A: Authenticator,
    U: UpdateSource,
    M: Messenger,
    S: Store,
{
    /// Creates a watcher from its collaborators.
    pub fn new(options: WatcherOptions<A, U, M, S>) -> Self {
        Self {
            authenticator: options.authenticator,
            source: options.source,
            messenger: options.messenger,
            session: options.session,
            dispatcher: Dispatcher::new(options.store),
            media: options.media,
            backoff: options.backoff,
        }
    }

    /// Runs the supervision loop until the token is cancelled. Never returns
    /// an error: every failure is logged and recovered by the cycle.
    pub async fn run(mut self, shutdown: CancellationToken) {
        // A failed first login is degraded mode, not fatal: the handshake's
        // own 401 handling drives re-authentication from here.
        if let Err(e) = self.authenticator.refresh().await {
            warn!("initial login failed, continuing unauthenticated: {e}");
        }

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                outcome = self.run_subscription() => match outcome {
                    Ok(()) => info!("subscription closed by server"),
                    Err(e) if e.is_unauthorized() => {
                        warn!("subscription rejected as unauthorized: {e}");
                        // Never re-present a token the server has refused.
                        self.session.invalidate().await;
                    }
                    Err(e) => error!("subscription failed: {e}"),
                },
            }

            info!("reconnecting in {:?}", self.backoff);
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.backoff) => {}
            }

            if let Err(e) = self.authenticator.refresh().await {
                warn!("re-login failed, reconnecting with existing credential state: {e}");
            }
        }

        info!("watcher stopped");
    }

    /// One `Connecting → Subscribed` pass: returns `Ok` on a normal close
    /// (still anomalous for a perpetual subscription) and `Err` on failure.
    async fn run_subscription(&mut self) -> Result<(), U::Error> {
        let token = self.session.current_token().await;
        let mut stream = self.source.subscribe(token.as_deref()).await?;

        while let Some(item) = stream.next().await {
            let batch = item?;
            let events = batch.manga_updates;
            debug!("received batch of {} events", events.len());
            if events.is_empty() {
                continue;
            }

            let queue = self.dispatcher.handle_batch(&events).await;
            for notification in queue {
                // Strictly sequential: delivery order matches detection
                // order, and one failure never blocks the rest of the batch.
                self.deliver(&notification).await;
            }
        }

        Ok(())
    }

    /// Best-effort, at-most-once delivery: the ledger already recorded the
    /// item, so a failed send is logged and never retried.
    async fn deliver(&self, notification: &Notification) {
        let rendered = render(notification);

        let photo = match rendered.image_ref.as_deref() {
            Some(path) => self.media.fetch(path).await,
            None => None,
        };

        let result = match photo {
            Some(bytes) => self.messenger.send_photo(bytes, &rendered.caption).await,
            None => self.messenger.send_text(&rendered.caption).await,
        };

        if let Err(e) = result {
            warn!(
                "failed to deliver notification for {}: {e}",
                notification.series.title
            );
        }
    }
}
