//! Turns raw update batches into the notifications that should actually be
//! delivered, using the dedup ledger as the source of truth.

use herald_source::{Chapter, RawUpdateEvent, Series};
use herald_store::Store;
use tracing::{info, warn};

use crate::ledger::{Classification, Ledger};

/// A notification awaiting rendering and delivery. Ephemeral; never
/// persisted.
#[derive(Clone, Debug)]
pub struct Notification {
    /// The series with new content.
    pub series: Series,
    /// The chapter that triggered the notification.
    pub chapter: Chapter,
    /// The update status from the originating event.
    pub status: String,
}

/// Consumes raw update batches and emits notifications for genuinely new
/// content, in batch order.
#[derive(Debug)]
pub struct Dispatcher<S: Store> {
    ledger: Ledger<S>,
}

impl<S: Store> Dispatcher<S> {
    /// Creates a dispatcher persisting its ledger to the given store.
    pub fn new(store: S) -> Self {
        Self {
            ledger: Ledger::new(store),
        }
    }

    /// Processes one batch of events and returns the notifications to send,
    /// preserving the relative order of the input. Events without a resolved
    /// latest chapter are ignored entirely. The ledger snapshot is reloaded
    /// at the start of each batch and flushed (if changed) before returning,
    /// i.e. before any notification goes out.
    ///
    /// The reload-classify-flush sequence is not atomic against an external
    /// writer of the state file; single-process ownership is assumed.
    pub async fn handle_batch(&mut self, events: &[RawUpdateEvent]) -> Vec<Notification> {
        self.ledger.reload().await;

        let mut queue = Vec::new();

        for event in events {
            let Some(chapter) = event.manga.latest_fetched_chapter.as_ref() else {
                continue;
            };

            let item_id = event.manga.item_id();
            let version = chapter.version();

            if self.ledger.classify(&item_id, &version) == Classification::New {
                info!(
                    "new chapter for {}: #{} {}",
                    event.manga.title,
                    version,
                    chapter.name.as_deref().unwrap_or_default()
                );

                queue.push(Notification {
                    series: event.manga.clone(),
                    chapter: chapter.clone(),
                    status: event.status.clone(),
                });
            }
        }

        if let Err(e) = self.ledger.flush_if_dirty().await {
            warn!("could not persist ledger state, continuing with in-memory state: {e}");
        }

        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use herald_store_memory::MemoryStore;

    fn event(id: i64, title: &str, version: &str) -> RawUpdateEvent {
        let number: serde_json::Number = version.parse().unwrap();
        RawUpdateEvent {
            status: "COMPLETE".to_string(),
            manga: Series {
                id,
                title: title.to_string(),
                thumbnail_url: None,
                source: None,
                latest_fetched_chapter: Some(Chapter {
                    id: 1,
                    chapter_number: number,
                    name: None,
                    upload_date: None,
                }),
            },
        }
    }

    fn inert_event(id: i64) -> RawUpdateEvent {
        RawUpdateEvent {
            status: "PENDING".to_string(),
            manga: Series {
                id,
                title: "no chapter yet".to_string(),
                thumbnail_url: None,
                source: None,
                latest_fetched_chapter: None,
            },
        }
    }

    #[tokio::test]
    async fn test_first_run_is_all_baseline() {
        let store = MemoryStore::new();
        let mut dispatcher = Dispatcher::new(store.clone());

        let queue = dispatcher
            .handle_batch(&[event(1, "A", "10"), event(2, "B", "3")])
            .await;

        assert!(queue.is_empty());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_order_preserved_and_unchanged_skipped() {
        let mut dispatcher = Dispatcher::new(MemoryStore::new());

        dispatcher
            .handle_batch(&[event(1, "A", "1"), event(2, "B", "1"), event(3, "C", "1")])
            .await;

        // A unchanged, B and C new: expect [B, C] in that order.
        let queue = dispatcher
            .handle_batch(&[event(1, "A", "1"), event(2, "B", "2"), event(3, "C", "2")])
            .await;

        let titles: Vec<_> = queue.iter().map(|n| n.series.title.as_str()).collect();
        assert_eq!(titles, ["B", "C"]);
    }

    #[tokio::test]
    async fn test_inert_events_ignored() {
        let store = MemoryStore::new();
        let mut dispatcher = Dispatcher::new(store.clone());

        let queue = dispatcher.handle_batch(&[inert_event(9)]).await;

        assert!(queue.is_empty());
        // Not classified, not recorded, nothing written.
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_same_batch_twice_notifies_once() {
        let mut dispatcher = Dispatcher::new(MemoryStore::new());

        dispatcher.handle_batch(&[event(1, "A", "10")]).await;

        let first = dispatcher.handle_batch(&[event(1, "A", "11")]).await;
        let second = dispatcher.handle_batch(&[event(1, "A", "11")]).await;

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_ledger_scenario() {
        let store = MemoryStore::new();
        let mut dispatcher = Dispatcher::new(store.clone());

        // Batch 1: baseline, one write, zero notifications.
        let queue = dispatcher.handle_batch(&[event(1, "A", "10")]).await;
        assert!(queue.is_empty());
        assert_eq!(store.write_count(), 1);

        // Batch 2: new chapter, one notification, one more write.
        let queue = dispatcher.handle_batch(&[event(1, "A", "11")]).await;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].chapter.version(), "11");
        assert_eq!(store.write_count(), 2);

        // Batch 3: identical again, nothing happens.
        let queue = dispatcher.handle_batch(&[event(1, "A", "11")]).await;
        assert!(queue.is_empty());
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_notification_carries_status() {
        let mut dispatcher = Dispatcher::new(MemoryStore::new());

        dispatcher.handle_batch(&[event(1, "A", "10")]).await;
        let queue = dispatcher.handle_batch(&[event(1, "A", "11")]).await;

        assert_eq!(queue[0].status, "COMPLETE");
    }
}
