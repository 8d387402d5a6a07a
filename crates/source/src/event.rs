//! Wire shapes delivered by the library server's update subscription.

use serde::{Deserialize, Serialize};

/// One inbound subscription message: a batch of raw update events.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBatch {
    /// The raw events in server order.
    #[serde(default)]
    pub manga_updates: Vec<RawUpdateEvent>,
}

/// One element of an inbound batch.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawUpdateEvent {
    /// The update status reported by the server (e.g. `COMPLETE`).
    pub status: String,
    /// The series the event refers to.
    pub manga: Series,
}

/// A trackable library entry with a stable identity.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    /// Stable numeric identity assigned by the server.
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Server-relative thumbnail resource path, if any.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// The upstream content source, if known.
    #[serde(default)]
    pub source: Option<SourceInfo>,
    /// The newest chapter the server knows about. Events without one are
    /// inert and must be skipped.
    #[serde(default)]
    pub latest_fetched_chapter: Option<Chapter>,
}

impl Series {
    /// The series identity as used by the dedup ledger.
    #[must_use]
    pub fn item_id(&self) -> String {
        self.id.to_string()
    }
}

/// The upstream source a series is tracked from.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SourceInfo {
    /// Source display name.
    pub name: String,
    /// Source language code.
    pub lang: String,
}

/// The latest known content unit of a series.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Stable numeric identity assigned by the server.
    pub id: i64,
    /// Chapter number as reported by the server. Kept as a JSON number and
    /// compared through its string rendering, never numerically.
    pub chapter_number: serde_json::Number,
    /// Chapter display name, if any.
    #[serde(default)]
    pub name: Option<String>,
    /// Upload marker, usually epoch milliseconds rendered as a string.
    #[serde(default)]
    pub upload_date: Option<String>,
}

impl Chapter {
    /// The version string recorded in the dedup ledger.
    #[must_use]
    pub fn version(&self) -> String {
        self.chapter_number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_event() {
        let json = r#"{
            "status": "COMPLETE",
            "manga": {
                "id": 42,
                "title": "Example Series",
                "thumbnailUrl": "/api/v1/manga/42/thumbnail",
                "source": { "name": "Example Source", "lang": "en" },
                "latestFetchedChapter": {
                    "id": 7,
                    "chapterNumber": 12.5,
                    "name": "The Turning Point",
                    "uploadDate": "1700000000000"
                }
            }
        }"#;

        let event: RawUpdateEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.status, "COMPLETE");
        assert_eq!(event.manga.item_id(), "42");

        let chapter = event.manga.latest_fetched_chapter.unwrap();
        assert_eq!(chapter.version(), "12.5");
        assert_eq!(chapter.name.as_deref(), Some("The Turning Point"));
    }

    #[test]
    fn test_deserialize_event_without_chapter() {
        let json = r#"{
            "status": "PENDING",
            "manga": { "id": 1, "title": "Bare Series" }
        }"#;

        let event: RawUpdateEvent = serde_json::from_str(json).unwrap();
        assert!(event.manga.latest_fetched_chapter.is_none());
        assert!(event.manga.thumbnail_url.is_none());
        assert!(event.manga.source.is_none());
    }

    #[test]
    fn test_integer_chapter_number_renders_without_fraction() {
        let json = r#"{ "id": 3, "chapterNumber": 10 }"#;

        let chapter: Chapter = serde_json::from_str(json).unwrap();
        assert_eq!(chapter.version(), "10");
    }

    #[test]
    fn test_empty_batch() {
        let batch: UpdateBatch = serde_json::from_str(r#"{ "mangaUpdates": [] }"#).unwrap();
        assert!(batch.manga_updates.is_empty());
    }
}
