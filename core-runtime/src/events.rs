//! # Event Bus System
//!
//! Typed broadcast events for the narration core, built on
//! `tokio::sync::broadcast`. Modules publish what happened (a narration job
//! progressed, playback paused, an archive entry was saved) and any number of
//! subscribers — UI adapters, tests, loggers — consume independently.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! let bus = EventBus::default();
//! let mut rx = bus.subscribe();
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Started { offset_secs: 0.0 }))
//!     .ok();
//! ```
//!
//! Slow subscribers receive `RecvError::Lagged` rather than blocking
//! publishers; the channel never applies backpressure to the core.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Narration pipeline events.
    Narration(NarrationEvent),
    /// Playback events.
    Playback(PlaybackEvent),
    /// Archive events.
    Archive(ArchiveEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Narration(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Archive(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Narration(NarrationEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Narration(NarrationEvent::AudioReady { .. }) => EventSeverity::Info,
            CoreEvent::Narration(NarrationEvent::NoAudio { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Archive(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Events emitted by the narration request pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum NarrationEvent {
    /// A conversion job was accepted.
    Started {
        /// Unique identifier for this job.
        job_id: String,
    },
    /// Sung-verse lyrics came back from the backend.
    LyricsComposed {
        job_id: String,
        /// Length of the composed lyrics, in characters.
        chars: usize,
    },
    /// Speech was synthesized and decoded into a playable buffer.
    AudioReady {
        job_id: String,
        /// Duration of the decoded narration.
        duration_secs: f64,
    },
    /// The backend reported no audio available (demo fallback). Terminal,
    /// not an error.
    NoAudio { job_id: String },
    /// A newer job replaced this one before its result was applied.
    Superseded { job_id: String },
    /// The pipeline failed.
    Failed {
        job_id: String,
        message: String,
        /// Whether retrying the conversion may succeed.
        recoverable: bool,
    },
}

impl NarrationEvent {
    fn description(&self) -> &str {
        match self {
            NarrationEvent::Started { .. } => "Narration job started",
            NarrationEvent::LyricsComposed { .. } => "Lyrics composed",
            NarrationEvent::AudioReady { .. } => "Narration audio ready",
            NarrationEvent::NoAudio { .. } => "No narration audio available",
            NarrationEvent::Superseded { .. } => "Narration job superseded",
            NarrationEvent::Failed { .. } => "Narration job failed",
        }
    }
}

/// Events emitted by the playback controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A sound unit was scheduled.
    Started {
        /// Logical offset the unit starts from, in seconds.
        offset_secs: f64,
    },
    /// Playback was paused; the stored offset reflects elapsed play time.
    Paused { offset_secs: f64 },
    /// Playback reached the end of the buffer without a manual stop.
    Completed,
    /// Playback failed to start.
    Error { message: String },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Completed => "Playback completed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

/// Events emitted by the narration archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum ArchiveEvent {
    /// A narration record was saved.
    Saved {
        /// Record id (creation timestamp in epoch milliseconds).
        id: i64,
        title: String,
    },
    /// A narration record was deleted.
    Deleted { id: i64 },
}

impl ArchiveEvent {
    fn description(&self) -> &str {
        match self {
            ArchiveEvent::Saved { .. } => "Narration saved to archive",
            ArchiveEvent::Deleted { .. } => "Narration deleted from archive",
        }
    }
}

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally: multiple producers (clone the
/// bus), multiple independent consumers, non-blocking sends, lagging
/// detection for slow subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event.
    ///
    /// Returns the number of subscribers that received it. Emitting with no
    /// subscribers is an error at the channel level; callers that don't care
    /// use `.ok()`.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Create a new independent subscription.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitted_events_reach_all_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = CoreEvent::Playback(PlaybackEvent::Started { offset_secs: 1.5 });
        let delivered = bus.emit(event.clone()).unwrap();
        assert_eq!(delivered, 2);

        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[test]
    fn emit_without_subscribers_is_send_error() {
        let bus = EventBus::new(16);
        assert!(bus
            .emit(CoreEvent::Playback(PlaybackEvent::Completed))
            .is_err());
    }

    #[test]
    fn severity_classification() {
        let failed = CoreEvent::Narration(NarrationEvent::Failed {
            job_id: "j1".into(),
            message: "quota".into(),
            recoverable: false,
        });
        assert_eq!(failed.severity(), EventSeverity::Error);

        let paused = CoreEvent::Playback(PlaybackEvent::Paused { offset_secs: 2.0 });
        assert_eq!(paused.severity(), EventSeverity::Debug);

        let saved = CoreEvent::Archive(ArchiveEvent::Saved {
            id: 1,
            title: "t".into(),
        });
        assert_eq!(saved.severity(), EventSeverity::Info);
    }

    #[test]
    fn events_serialize_with_tagged_layout() {
        let event = CoreEvent::Narration(NarrationEvent::NoAudio {
            job_id: "j2".into(),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Narration\""));
        assert!(json.contains("\"event\":\"NoAudio\""));
    }
}
