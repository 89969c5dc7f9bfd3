//! # Narration Archive Repository
//!
//! Persists saved narrations and the current editing session as JSON blobs
//! under fixed keys in the host [`SettingsStore`]. Writers always replace the
//! whole blob; records are kept newest first.

use crate::error::{ArchiveError, Result};
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use core_runtime::events::{ArchiveEvent, CoreEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Store key holding the saved-narration array.
pub const ARCHIVE_KEY: &str = "audio_archive";

/// Store key holding the current editing session.
pub const SESSION_KEY: &str = "audio_session";

/// Maximum characters of article text used for a derived title.
const TITLE_MAX_CHARS: usize = 20;

/// A saved narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationRecord {
    /// Creation timestamp in epoch milliseconds; doubles as the record id.
    pub id: i64,
    pub title: String,
    pub lyrics: String,
    /// Human-readable creation time (RFC 3339).
    pub timestamp: String,
}

/// The in-progress editing session: article text plus composed lyrics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NarrationSession {
    pub article_text: String,
    pub lyrics: Option<String>,
}

/// Archive persistence over the host settings store.
pub struct ArchiveRepository {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
}

impl ArchiveRepository {
    pub fn new(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            events: None,
        }
    }

    /// Attach an event bus; save/delete operations are published to it.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// All saved narrations, newest first. An absent blob is an empty
    /// archive, not an error.
    pub async fn list(&self) -> Result<Vec<NarrationRecord>> {
        match self.store.get_string(ARCHIVE_KEY).await? {
            Some(blob) => parse_blob(ARCHIVE_KEY, &blob),
            None => Ok(Vec::new()),
        }
    }

    /// Save a narration composed from `article_text`, returning the record.
    ///
    /// The title is the first line of the article, truncated.
    #[instrument(skip(self, article_text, lyrics))]
    pub async fn save(&self, article_text: &str, lyrics: &str) -> Result<NarrationRecord> {
        let record = NarrationRecord {
            id: self.clock.unix_timestamp_millis(),
            title: derive_title(article_text),
            lyrics: lyrics.to_string(),
            timestamp: self.clock.now().to_rfc3339(),
        };

        let mut records = self.list().await?;
        records.insert(0, record.clone());
        self.store
            .set_string(ARCHIVE_KEY, &to_blob(ARCHIVE_KEY, &records)?)
            .await?;

        debug!(id = record.id, "narration saved");
        self.emit(ArchiveEvent::Saved {
            id: record.id,
            title: record.title.clone(),
        });
        Ok(record)
    }

    /// Delete a record by id. Returns `false` if no such record existed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut records = self.list().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }

        self.store
            .set_string(ARCHIVE_KEY, &to_blob(ARCHIVE_KEY, &records)?)
            .await?;
        self.emit(ArchiveEvent::Deleted { id });
        Ok(true)
    }

    /// Persist the current editing session.
    pub async fn save_session(&self, session: &NarrationSession) -> Result<()> {
        self.store
            .set_string(SESSION_KEY, &to_blob(SESSION_KEY, session)?)
            .await?;
        Ok(())
    }

    /// Restore the last editing session, if any.
    pub async fn load_session(&self) -> Result<Option<NarrationSession>> {
        match self.store.get_string(SESSION_KEY).await? {
            Some(blob) => parse_blob(SESSION_KEY, &blob).map(Some),
            None => Ok(None),
        }
    }

    /// Forget the current editing session.
    pub async fn clear_session(&self) -> Result<()> {
        self.store.remove(SESSION_KEY).await?;
        Ok(())
    }

    fn emit(&self, event: ArchiveEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is not a failure.
            let _ = bus.emit(CoreEvent::Archive(event));
        }
    }
}

fn parse_blob<T: serde::de::DeserializeOwned>(key: &str, blob: &str) -> Result<T> {
    serde_json::from_str(blob).map_err(|e| ArchiveError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn to_blob<T: Serialize>(key: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ArchiveError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// First line of the article, truncated to a title-sized prefix.
pub fn derive_title(article_text: &str) -> String {
    let first_line = article_text.lines().next().unwrap_or("").trim();
    let title: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
    if title.is_empty() {
        "Sung news bulletin".to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_first_line_truncated_by_chars() {
        assert_eq!(derive_title("Breaking: markets rally\nmore text"), "Breaking: markets ra");
        assert_eq!(derive_title("short"), "short");
        // Multi-byte characters count as single title characters.
        assert_eq!(derive_title("뉴스 속보입니다"), "뉴스 속보입니다");
    }

    #[test]
    fn empty_article_gets_fallback_title() {
        assert_eq!(derive_title(""), "Sung news bulletin");
        assert_eq!(derive_title("   \nbody"), "Sung news bulletin");
    }

    #[test]
    fn records_round_trip_through_json() {
        let record = NarrationRecord {
            id: 1_700_000_000_000,
            title: "t".into(),
            lyrics: "l".into(),
            timestamp: "2026-08-07T00:00:00+00:00".into(),
        };
        let json = serde_json::to_string(&vec![record.clone()]).unwrap();
        let back: Vec<NarrationRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![record]);
    }
}
