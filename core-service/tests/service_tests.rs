//! End-to-end service tests with a mocked provider, sink, store, and clock.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bridge_traits::audio::{AudioSink, PcmBuffer, SoundUnit, UnitId};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::narration::{NarrationError, NarrationProvider, Result as NarrationResult};
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use chrono::{DateTime, TimeZone, Utc};
use core_audio::PlayerState;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, NarrationEvent, Receiver};
use core_service::{
    ConversionOutcome, CoreDependencies, CoreError, NarrationService, ToggleOutcome,
};
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Mocks
// ============================================================================

mock! {
    Provider {}

    #[async_trait]
    impl NarrationProvider for Provider {
        async fn compose_lyrics(&self, article: &str) -> NarrationResult<String>;
        async fn synthesize(&self, lyrics: &str) -> NarrationResult<Option<String>>;
    }
}

struct SinkUnit {
    id: UnitId,
    stopped: Arc<AtomicBool>,
}

impl SoundUnit for SinkUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

struct TestSink {
    clock: Mutex<f64>,
    next_id: AtomicU64,
    started: Mutex<Vec<UnitId>>,
    completions: broadcast::Sender<UnitId>,
}

impl TestSink {
    fn new() -> Arc<Self> {
        let (completions, _) = broadcast::channel(16);
        Arc::new(Self {
            clock: Mutex::new(0.0),
            next_id: AtomicU64::new(0),
            started: Mutex::new(Vec::new()),
            completions,
        })
    }

    fn start_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    /// Report the most recent unit as finished, as the platform would.
    fn complete_last(&self) {
        let id = *self.started.lock().unwrap().last().unwrap();
        let _ = self.completions.send(id);
    }
}

impl AudioSink for TestSink {
    fn resume(&self) -> BridgeResult<()> {
        Ok(())
    }

    fn clock_seconds(&self) -> f64 {
        *self.clock.lock().unwrap()
    }

    fn start_unit(
        &self,
        _buffer: Arc<PcmBuffer>,
        _start_at: f64,
        _offset_secs: f64,
    ) -> BridgeResult<Box<dyn SoundUnit>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.started.lock().unwrap().push(id);
        Ok(Box::new(SinkUnit {
            id,
            stopped: Arc::new(AtomicBool::new(false)),
        }))
    }

    fn completions(&self) -> broadcast::Receiver<UnitId> {
        self.completions.subscribe()
    }
}

#[derive(Default)]
struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
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

    async fn set_bool(&self, _key: &str, _value: bool) -> BridgeResult<()> {
        Ok(())
    }

    async fn get_bool(&self, _key: &str) -> BridgeResult<Option<bool>> {
        Ok(None)
    }

    async fn remove(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_770_000_000_000).unwrap()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// 0.2 seconds of silence in the narration wire format.
fn payload() -> String {
    STANDARD.encode(vec![0u8; 9_600])
}

fn service_with(
    provider: impl NarrationProvider + 'static,
    sink: &Arc<TestSink>,
) -> NarrationService {
    NarrationService::new(
        CoreDependencies::new(
            Arc::new(provider),
            Arc::clone(sink) as Arc<dyn AudioSink>,
            Arc::new(MemoryStore::default()),
            Arc::new(FixedClock),
        ),
        CoreConfig::default(),
    )
    .unwrap()
}

fn drain(rx: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}

// ============================================================================
// Conversion pipeline
// ============================================================================

#[tokio::test]
async fn convert_plays_decoded_audio() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .returning(|_| Ok("Eolssu! The markets sing".to_string()));
    provider
        .expect_synthesize()
        .returning(|_| Ok(Some(payload())));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);

    let outcome = service.convert("Markets rallied today.").await.unwrap();
    assert_eq!(
        outcome,
        ConversionOutcome::Playing {
            lyrics: "Eolssu! The markets sing".to_string()
        }
    );
    assert_eq!(service.playback_state(), PlayerState::Playing);
    assert_eq!(sink.start_count(), 1);
    assert_eq!(
        service.session().lyrics.as_deref(),
        Some("Eolssu! The markets sing")
    );
}

#[tokio::test]
async fn no_audio_fallback_is_terminal_non_error() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .returning(|_| Ok("demo verse".to_string()));
    provider.expect_synthesize().returning(|_| Ok(None));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);
    let mut rx = service.events().subscribe();

    let outcome = service.convert("article").await.unwrap();
    assert_eq!(
        outcome,
        ConversionOutcome::LyricsOnly {
            lyrics: "demo verse".to_string()
        }
    );
    assert_eq!(service.playback_state(), PlayerState::Idle);
    assert_eq!(sink.start_count(), 0);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, CoreEvent::Narration(NarrationEvent::NoAudio { .. }))));
    assert!(!events
        .iter()
        .any(|e| matches!(e, CoreEvent::Narration(NarrationEvent::Failed { .. }))));
}

#[tokio::test]
async fn malformed_payload_surfaces_audio_unavailable() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .returning(|_| Ok("verse".to_string()));
    provider
        .expect_synthesize()
        .returning(|_| Ok(Some("!!!not base64!!!".to_string())));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);
    let mut rx = service.events().subscribe();

    let err = service.convert("article").await.unwrap_err();
    assert!(matches!(err, CoreError::Audio(_)));
    assert!(!err.is_recoverable());
    assert_eq!(service.playback_state(), PlayerState::Idle);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::Narration(NarrationEvent::Failed {
            recoverable: false,
            ..
        })
    )));
}

#[tokio::test]
async fn quota_failure_propagates_as_non_recoverable() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .returning(|_| Err(NarrationError::QuotaExceeded));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);

    let err = service.convert("article").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Narration(NarrationError::QuotaExceeded)
    ));
    assert!(!err.is_recoverable());
    assert_eq!(service.playback_state(), PlayerState::Idle);
}

// ============================================================================
// Toggle semantics
// ============================================================================

#[tokio::test]
async fn toggle_pauses_then_resumes() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .returning(|_| Ok("verse".to_string()));
    provider
        .expect_synthesize()
        .returning(|_| Ok(Some(payload())));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);
    service.convert("article").await.unwrap();

    assert_eq!(service.toggle().await.unwrap(), ToggleOutcome::Paused);
    assert_eq!(service.playback_state(), PlayerState::Ready);

    assert_eq!(service.toggle().await.unwrap(), ToggleOutcome::Resumed);
    assert_eq!(service.playback_state(), PlayerState::Playing);
}

#[tokio::test]
async fn toggle_runs_the_pipeline_when_nothing_is_loaded() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .times(2)
        .returning(|_| Ok("verse".to_string()));
    provider
        .expect_synthesize()
        .times(2)
        .returning(|_| Ok(None));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);

    // Nothing anywhere yet: not even article text.
    assert!(matches!(
        service.toggle().await,
        Err(CoreError::NoNarrationLoaded)
    ));

    service.convert("article").await.unwrap();
    // Still no buffer (demo fallback), but the session has text now, so
    // toggle runs the pipeline end-to-end.
    let outcome = service.toggle().await.unwrap();
    assert!(matches!(
        outcome,
        ToggleOutcome::Converted(ConversionOutcome::LyricsOnly { .. })
    ));
}

// ============================================================================
// Request supersession
// ============================================================================

struct GatedProvider {
    gate: Arc<Notify>,
    synth_calls: Arc<AtomicU64>,
}

#[async_trait]
impl NarrationProvider for GatedProvider {
    async fn compose_lyrics(&self, article: &str) -> NarrationResult<String> {
        Ok(format!("verse for {}", article))
    }

    async fn synthesize(&self, _lyrics: &str) -> NarrationResult<Option<String>> {
        if self.synth_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            // First conversion stalls in the backend until released.
            self.gate.notified().await;
            Ok(Some(payload()))
        } else {
            Ok(None)
        }
    }
}

#[tokio::test]
async fn superseded_conversion_result_is_discarded() {
    let gate = Arc::new(Notify::new());
    let synth_calls = Arc::new(AtomicU64::new(0));
    let provider = GatedProvider {
        gate: Arc::clone(&gate),
        synth_calls: Arc::clone(&synth_calls),
    };

    let sink = TestSink::new();
    let service = Arc::new(service_with(provider, &sink));

    let first = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.convert("first").await }
    });
    wait_until(|| synth_calls.load(Ordering::SeqCst) >= 1).await;

    // A newer conversion supersedes the stalled one.
    let outcome = service.convert("second").await.unwrap();
    assert!(matches!(outcome, ConversionOutcome::LyricsOnly { .. }));

    gate.notify_waiters();
    let stale = first.await.unwrap().unwrap();
    assert_eq!(stale, ConversionOutcome::Superseded);

    // The stale audio never reached the player or the session.
    assert_eq!(service.playback_state(), PlayerState::Idle);
    assert_eq!(sink.start_count(), 0);
    assert_eq!(service.session().lyrics.as_deref(), Some("verse for second"));
}

// ============================================================================
// Natural end through the completion channel
// ============================================================================

#[tokio::test]
async fn natural_end_flows_from_sink_to_controller() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .returning(|_| Ok("verse".to_string()));
    provider
        .expect_synthesize()
        .returning(|_| Ok(Some(payload())));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);
    service.convert("article").await.unwrap();
    assert_eq!(service.playback_state(), PlayerState::Playing);

    sink.complete_last();
    wait_until(|| service.playback_state() == PlayerState::Ready).await;
    assert_eq!(service.playback_offset_secs(), 0.0);
}

// ============================================================================
// Export and archive
// ============================================================================

#[tokio::test]
async fn export_produces_timestamped_wav() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .returning(|_| Ok("verse".to_string()));
    provider
        .expect_synthesize()
        .returning(|_| Ok(Some(payload())));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);
    service.convert("article").await.unwrap();

    let export = service.export_wav().unwrap();
    assert_eq!(export.filename, "sungnews_narration_1770000000000.wav");
    assert_eq!(export.bytes.len(), 44 + 9_600);
}

#[tokio::test]
async fn export_without_narration_is_an_error() {
    let provider = MockProvider::new();
    let sink = TestSink::new();
    let service = service_with(provider, &sink);
    assert!(matches!(
        service.export_wav(),
        Err(CoreError::NoNarrationLoaded)
    ));
}

#[tokio::test]
async fn archive_save_load_delete_cycle() {
    let mut provider = MockProvider::new();
    provider
        .expect_compose_lyrics()
        .returning(|_| Ok("archived verse".to_string()));
    provider.expect_synthesize().returning(|_| Ok(None));

    let sink = TestSink::new();
    let service = service_with(provider, &sink);

    // Saving before any lyrics exist is rejected.
    assert!(matches!(
        service.save_to_archive().await,
        Err(CoreError::NoLyricsComposed)
    ));

    service.convert("Article headline\nbody").await.unwrap();
    let record = service.save_to_archive().await.unwrap();
    assert_eq!(record.title, "Article headline");
    assert_eq!(record.lyrics, "archived verse");

    let entries = service.archive_entries().await.unwrap();
    assert_eq!(entries.len(), 1);

    let loaded = service.load_archived(record.id).await.unwrap();
    assert_eq!(loaded.id, record.id);
    assert_eq!(service.session().lyrics.as_deref(), Some("archived verse"));
    assert_eq!(service.playback_state(), PlayerState::Idle);

    assert!(service.delete_from_archive(record.id).await.unwrap());
    assert!(service.archive_entries().await.unwrap().is_empty());
}
