//! Archive repository tests against an in-memory settings store and a fixed
//! clock.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use chrono::{DateTime, TimeZone, Utc};
use core_archive::{ArchiveRepository, NarrationSession, ARCHIVE_KEY};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// In-memory SettingsStore
// ============================================================================

#[derive(Default)]
struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    bools: Mutex<HashMap<String, bool>>,
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.bools.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        Ok(self.bools.lock().unwrap().get(key).copied())
    }

    async fn remove(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        self.bools.lock().unwrap().remove(key);
        Ok(())
    }
}

// ============================================================================
// Ticking test clock
// ============================================================================

struct TestClock {
    millis: Mutex<i64>,
}

impl TestClock {
    fn starting_at(millis: i64) -> Arc<Self> {
        Arc::new(Self {
            millis: Mutex::new(millis),
        })
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        let mut millis = self.millis.lock().unwrap();
        *millis += 1_000; // each observation is one second later
        Utc.timestamp_millis_opt(*millis).unwrap()
    }
}

fn repository() -> (ArchiveRepository, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let clock = TestClock::starting_at(1_770_000_000_000);
    (
        ArchiveRepository::new(
            Arc::clone(&store) as Arc<dyn SettingsStore>,
            clock as Arc<dyn Clock>,
        ),
        store,
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn empty_archive_lists_nothing() {
    let (repo, _) = repository();
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn saved_records_come_back_newest_first() {
    let (repo, _) = repository();

    let first = repo.save("First article\nbody", "verse one").await.unwrap();
    let second = repo.save("Second article", "verse two").await.unwrap();
    assert!(second.id > first.id);

    let records = repo.list().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], second);
    assert_eq!(records[1], first);
    assert_eq!(records[1].title, "First article");
}

#[tokio::test]
async fn delete_removes_only_the_requested_record() {
    let (repo, _) = repository();

    let keep = repo.save("keep", "k").await.unwrap();
    let gone = repo.save("drop", "d").await.unwrap();

    assert!(repo.delete(gone.id).await.unwrap());
    assert!(!repo.delete(gone.id).await.unwrap());

    let records = repo.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, keep.id);
}

#[tokio::test]
async fn session_round_trips_and_clears() {
    let (repo, _) = repository();
    assert!(repo.load_session().await.unwrap().is_none());

    let session = NarrationSession {
        article_text: "draft article".to_string(),
        lyrics: Some("draft verse".to_string()),
    };
    repo.save_session(&session).await.unwrap();
    assert_eq!(repo.load_session().await.unwrap(), Some(session));

    repo.clear_session().await.unwrap();
    assert!(repo.load_session().await.unwrap().is_none());
}

#[tokio::test]
async fn corrupt_archive_blob_is_reported() {
    let (repo, store) = repository();
    store.set_string(ARCHIVE_KEY, "not json").await.unwrap();

    let err = repo.list().await.unwrap_err();
    assert!(matches!(err, core_archive::ArchiveError::Corrupt { .. }));
}

#[tokio::test]
async fn record_timestamps_come_from_the_clock() {
    let (repo, _) = repository();
    let record = repo.save("Article", "verse").await.unwrap();
    // Fixed epoch base plus the clock's one-second observation ticks.
    assert!(record.id >= 1_770_000_000_000);
    assert!(record.timestamp.starts_with("2026-"));
}
