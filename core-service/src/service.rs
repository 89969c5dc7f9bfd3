//! # Narration Service
//!
//! End-to-end orchestration of one narration session: article text goes to
//! the narration backend for lyrics, lyrics go back for speech, the payload
//! is decoded and played, and the session/archive state is kept persistent.
//!
//! ## Request supersession
//!
//! There is no cancellation of an in-flight backend request. Instead every
//! conversion takes a monotonically increasing request id; after each await
//! the pipeline re-checks that it is still the current request and discards
//! its result otherwise. A stale conversion can therefore never load a
//! buffer or start playback over a newer one.

use crate::error::{CoreError, Result};
use bridge_traits::audio::{AudioSink, PcmSpec};
use bridge_traits::narration::NarrationProvider;
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use bytes::Bytes;
use core_archive::{ArchiveRepository, NarrationRecord, NarrationSession};
use core_audio::{decode_base64_pcm, encode_wav, NarrationPlayer, PlayerState};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, NarrationEvent, RecvError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub provider: Arc<dyn NarrationProvider>,
    pub audio_sink: Arc<dyn AudioSink>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        provider: Arc<dyn NarrationProvider>,
        audio_sink: Arc<dyn AudioSink>,
        settings_store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            audio_sink,
            settings_store,
            clock,
        }
    }
}

/// Result of a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Audio was decoded, loaded, and playback started.
    Playing { lyrics: String },
    /// The backend produced lyrics but no audio (demo fallback). Terminal,
    /// not an error.
    LyricsOnly { lyrics: String },
    /// A newer conversion superseded this one; its result was discarded.
    Superseded,
}

/// Result of a play/pause toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Paused,
    Resumed,
    /// Nothing was loaded; the full pipeline ran instead.
    Converted(ConversionOutcome),
}

/// A WAV file ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavExport {
    pub filename: String,
    pub bytes: Bytes,
}

/// Primary façade exposed to host applications.
pub struct NarrationService {
    provider: Arc<dyn NarrationProvider>,
    player: Arc<Mutex<NarrationPlayer>>,
    archive: ArchiveRepository,
    clock: Arc<dyn Clock>,
    events: EventBus,
    session: Mutex<NarrationSession>,
    request_seq: AtomicU64,
    completion_task: tokio::task::JoinHandle<()>,
}

impl NarrationService {
    /// Create a new service from the provided dependencies.
    ///
    /// Must be called inside a tokio runtime: the service spawns a task that
    /// pumps sink completion messages into the playback controller.
    pub fn new(deps: CoreDependencies, config: CoreConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;

        let events = EventBus::default();
        let player = Arc::new(Mutex::new(
            NarrationPlayer::new(Arc::clone(&deps.audio_sink), config.playback.clone())
                .with_event_bus(events.clone()),
        ));

        let mut completions = deps.audio_sink.completions();
        let completion_task = tokio::spawn({
            let player = Arc::clone(&player);
            async move {
                loop {
                    match completions.recv().await {
                        Ok(id) => player.lock().on_unit_ended(id),
                        Err(RecvError::Lagged(missed)) => {
                            warn!(missed, "unit completion messages lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });

        let archive = ArchiveRepository::new(
            Arc::clone(&deps.settings_store),
            Arc::clone(&deps.clock),
        )
        .with_event_bus(events.clone());

        Ok(Self {
            provider: deps.provider,
            player,
            archive,
            clock: deps.clock,
            events,
            session: Mutex::new(NarrationSession::default()),
            request_seq: AtomicU64::new(0),
            completion_task,
        })
    }

    /// The service event bus; subscribe for narration/playback/archive
    /// progress.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Snapshot of the current editing session.
    pub fn session(&self) -> NarrationSession {
        self.session.lock().clone()
    }

    /// Current playback state.
    pub fn playback_state(&self) -> PlayerState {
        self.player.lock().state()
    }

    /// Stored resume offset in seconds.
    pub fn playback_offset_secs(&self) -> f64 {
        self.player.lock().offset_secs()
    }

    /// Restore the last persisted editing session, if any.
    pub async fn restore_session(&self) -> Result<()> {
        if let Some(session) = self.archive.load_session().await? {
            *self.session.lock() = session;
        }
        Ok(())
    }

    /// Run the full conversion pipeline: lyrics, speech, decode, play.
    #[instrument(skip_all, fields(chars = article_text.len()))]
    pub async fn convert(&self, article_text: &str) -> Result<ConversionOutcome> {
        let request_id = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let job_id = Uuid::new_v4().to_string();
        info!(job_id = %job_id, "conversion started");
        self.emit(NarrationEvent::Started {
            job_id: job_id.clone(),
        });

        // Discard the previous narration before the round-trips begin; the
        // UI stays responsive while the controller sits in Idle.
        self.player.lock().unload();
        {
            let mut session = self.session.lock();
            session.article_text = article_text.to_string();
            session.lyrics = None;
        }
        self.persist_session().await;

        let lyrics = match self.provider.compose_lyrics(article_text).await {
            Ok(lyrics) => lyrics,
            Err(e) => {
                self.emit_failed(&job_id, &e.to_string(), e.is_retryable());
                return Err(e.into());
            }
        };
        if self.is_stale(request_id) {
            self.emit(NarrationEvent::Superseded { job_id });
            return Ok(ConversionOutcome::Superseded);
        }
        self.session.lock().lyrics = Some(lyrics.clone());
        self.persist_session().await;
        self.emit(NarrationEvent::LyricsComposed {
            job_id: job_id.clone(),
            chars: lyrics.chars().count(),
        });

        let payload = match self.provider.synthesize(&lyrics).await {
            Ok(payload) => payload,
            Err(e) => {
                self.emit_failed(&job_id, &e.to_string(), e.is_retryable());
                return Err(e.into());
            }
        };
        if self.is_stale(request_id) {
            self.emit(NarrationEvent::Superseded { job_id });
            return Ok(ConversionOutcome::Superseded);
        }

        let Some(base64_pcm) = payload else {
            // "No audio available" is a terminal non-error state.
            self.emit(NarrationEvent::NoAudio { job_id });
            return Ok(ConversionOutcome::LyricsOnly { lyrics });
        };

        let buffer = match decode_base64_pcm(&base64_pcm, PcmSpec::narration()) {
            Ok(buffer) => Arc::new(buffer),
            Err(e) => {
                self.emit_failed(&job_id, &e.to_string(), false);
                return Err(e.into());
            }
        };
        if self.is_stale(request_id) {
            self.emit(NarrationEvent::Superseded { job_id });
            return Ok(ConversionOutcome::Superseded);
        }

        self.emit(NarrationEvent::AudioReady {
            job_id,
            duration_secs: buffer.duration_secs(),
        });

        {
            let mut player = self.player.lock();
            player.load(buffer);
            player.play(0.0)?;
        }
        Ok(ConversionOutcome::Playing { lyrics })
    }

    /// Play/pause toggle.
    ///
    /// Pauses when playing; resumes when a narration is loaded; and when
    /// nothing has been decoded yet but article text is available, runs the
    /// whole pipeline end-to-end instead.
    pub async fn toggle(&self) -> Result<ToggleOutcome> {
        {
            let mut player = self.player.lock();
            if player.is_playing() {
                player.pause();
                return Ok(ToggleOutcome::Paused);
            }
            if player.state() != PlayerState::Idle {
                player.resume()?;
                return Ok(ToggleOutcome::Resumed);
            }
        }

        let article_text = self.session.lock().article_text.clone();
        if article_text.trim().is_empty() {
            return Err(CoreError::NoNarrationLoaded);
        }
        let outcome = self.convert(&article_text).await?;
        Ok(ToggleOutcome::Converted(outcome))
    }

    /// Pause playback, keeping the resume offset.
    pub fn pause(&self) {
        self.player.lock().pause();
    }

    /// Restart the loaded narration from the beginning.
    pub fn restart(&self) -> Result<()> {
        self.player.lock().restart().map_err(Into::into)
    }

    /// Encode the loaded narration as a downloadable WAV file.
    pub fn export_wav(&self) -> Result<WavExport> {
        let buffer = self
            .player
            .lock()
            .buffer()
            .ok_or(CoreError::NoNarrationLoaded)?;

        let bytes = encode_wav(&buffer);
        let filename = format!(
            "sungnews_narration_{}.wav",
            self.clock.unix_timestamp_millis()
        );
        debug!(filename = %filename, len = bytes.len(), "narration exported");
        Ok(WavExport { filename, bytes })
    }

    /// Save the current session's narration to the archive.
    pub async fn save_to_archive(&self) -> Result<NarrationRecord> {
        let (article_text, lyrics) = {
            let session = self.session.lock();
            (session.article_text.clone(), session.lyrics.clone())
        };
        let lyrics = lyrics.ok_or(CoreError::NoLyricsComposed)?;
        self.archive
            .save(&article_text, &lyrics)
            .await
            .map_err(Into::into)
    }

    /// All archived narrations, newest first.
    pub async fn archive_entries(&self) -> Result<Vec<NarrationRecord>> {
        self.archive.list().await.map_err(Into::into)
    }

    /// Delete an archived narration.
    pub async fn delete_from_archive(&self, id: i64) -> Result<bool> {
        self.archive.delete(id).await.map_err(Into::into)
    }

    /// Bring an archived narration back into the session.
    ///
    /// The stored lyrics become current and playback state is discarded;
    /// audio has to be synthesized again before it can play.
    pub async fn load_archived(&self, id: i64) -> Result<NarrationRecord> {
        let record = self
            .archive
            .list()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(CoreError::NoNarrationLoaded)?;

        {
            let mut session = self.session.lock();
            session.article_text = record.title.clone();
            session.lyrics = Some(record.lyrics.clone());
        }
        self.persist_session().await;
        self.player.lock().unload();
        Ok(record)
    }

    fn is_stale(&self, request_id: u64) -> bool {
        let current = self.request_seq.load(Ordering::SeqCst);
        if current != request_id {
            debug!(request_id, current, "conversion result is stale");
            return true;
        }
        false
    }

    async fn persist_session(&self) {
        let snapshot = self.session.lock().clone();
        if let Err(e) = self.archive.save_session(&snapshot).await {
            warn!("session persist failed: {}", e);
        }
    }

    fn emit(&self, event: NarrationEvent) {
        // No subscribers is not a failure.
        let _ = self.events.emit(CoreEvent::Narration(event));
    }

    fn emit_failed(&self, job_id: &str, message: &str, recoverable: bool) {
        self.emit(NarrationEvent::Failed {
            job_id: job_id.to_string(),
            message: message.to_string(),
            recoverable,
        });
    }
}

impl Drop for NarrationService {
    fn drop(&mut self) {
        self.completion_task.abort();
        self.player.lock().stop();
    }
}
