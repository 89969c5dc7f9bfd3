//! # Playback Controller
//!
//! Owns the relationship between the logical narration offset and the audio
//! clock across play/pause/resume/restart. The controller is an explicit
//! struct holding `{sink, buffer, state}`; it is constructed once per
//! playback session and threaded through calls — no ambient globals.
//!
//! ## State machine
//!
//! ```text
//! Idle ──load──> Ready ──play──> Playing ──pause──> Paused
//!                  ^                │ ^               │
//!                  └──natural end───┘ └────resume─────┘
//! ```
//!
//! A sound unit is one-shot: every `play` stops the previous unit and creates
//! exactly one new one, so unit creation is strictly serialized and at most
//! one unit emits sound at any instant. Completion arrives as an explicit
//! [`UnitId`] message; ids from already replaced units are stale and ignored,
//! which is what makes a late natural-end callback harmless after pause,
//! reload, or teardown.

use crate::error::{AudioError, Result};
use bridge_traits::audio::{AudioSink, PcmBuffer, SoundUnit, UnitId};
use core_runtime::config::PlaybackConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::Arc;
use tracing::{debug, warn};

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No narration loaded.
    Idle,
    /// Narration loaded, positioned at the start.
    Ready,
    /// A sound unit is scheduled or audible.
    Playing,
    /// Narration loaded with a non-zero resume offset.
    Paused,
}

/// Playback controller for one narration session.
pub struct NarrationPlayer {
    sink: Arc<dyn AudioSink>,
    config: PlaybackConfig,
    events: Option<EventBus>,
    buffer: Option<Arc<PcmBuffer>>,
    unit: Option<Box<dyn SoundUnit>>,
    /// Id of the most recently started unit; kept after the unit handle is
    /// dropped so its completion message can still be matched.
    unit_id: Option<UnitId>,
    /// Logical position to resume from, in seconds.
    offset_secs: f64,
    /// Audio-clock time at which the current segment started.
    clock_anchor: f64,
    playing: bool,
    /// Whether the current unit was stopped by pause/load/teardown rather
    /// than by reaching the end of the buffer.
    manual_stop: bool,
}

impl NarrationPlayer {
    pub fn new(sink: Arc<dyn AudioSink>, config: PlaybackConfig) -> Self {
        Self {
            sink,
            config,
            events: None,
            buffer: None,
            unit: None,
            unit_id: None,
            offset_secs: 0.0,
            clock_anchor: 0.0,
            playing: false,
            manual_stop: false,
        }
    }

    /// Attach an event bus; playback transitions are published to it.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Current controller state.
    pub fn state(&self) -> PlayerState {
        if self.buffer.is_none() {
            PlayerState::Idle
        } else if self.playing {
            PlayerState::Playing
        } else if self.offset_secs > 0.0 {
            PlayerState::Paused
        } else {
            PlayerState::Ready
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Stored resume offset in seconds.
    pub fn offset_secs(&self) -> f64 {
        self.offset_secs
    }

    /// Duration of the loaded narration, 0 when idle.
    pub fn duration_secs(&self) -> f64 {
        self.buffer.as_ref().map_or(0.0, |b| b.duration_secs())
    }

    /// The loaded narration buffer, if any.
    pub fn buffer(&self) -> Option<Arc<PcmBuffer>> {
        self.buffer.clone()
    }

    /// Load a new narration, replacing any previous one.
    ///
    /// Any active unit is stopped first and the offset resets to 0.
    pub fn load(&mut self, buffer: Arc<PcmBuffer>) {
        self.halt_unit();
        self.buffer = Some(buffer);
        self.offset_secs = 0.0;
        self.playing = false;
    }

    /// Discard the loaded narration and return to `Idle`.
    pub fn unload(&mut self) {
        self.halt_unit();
        self.buffer = None;
        self.offset_secs = 0.0;
        self.playing = false;
    }

    /// Start playback from `from_offset` seconds.
    ///
    /// The offset is clamped: a value at or past the buffer duration (or
    /// below zero) restarts from 0, never an out-of-range unit start. The
    /// audio subsystem is resumed first; if that fails the operation surfaces
    /// as a playback failure and the controller keeps its pre-operation
    /// state — there is no retry here.
    pub fn play(&mut self, from_offset: f64) -> Result<()> {
        let buffer = self.buffer.clone().ok_or(AudioError::NoBufferLoaded)?;

        if let Err(e) = self.sink.resume() {
            let err = AudioError::PlaybackFailed(format!("audio subsystem resume: {}", e));
            self.emit(PlaybackEvent::Error {
                message: err.to_string(),
            });
            return Err(err);
        }

        // Replace, never overlap: the old unit is stopped before a new one
        // exists. Marked manual so its completion cannot reset the offset if
        // starting the replacement fails below.
        if let Some(mut unit) = self.unit.take() {
            self.manual_stop = true;
            unit.stop();
        }

        let start_offset = if from_offset >= buffer.duration_secs() || from_offset < 0.0 {
            0.0
        } else {
            from_offset
        };

        // The fixed delay absorbs audio-subsystem wake-up latency; anchoring
        // at the scheduled start keeps the pause elapsed-time math exact.
        let start_at = self.sink.clock_seconds() + self.config.start_delay_secs;

        let unit = match self.sink.start_unit(Arc::clone(&buffer), start_at, start_offset) {
            Ok(unit) => unit,
            Err(e) => {
                self.playing = false;
                let err = AudioError::PlaybackFailed(format!("unit start: {}", e));
                self.emit(PlaybackEvent::Error {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        debug!(offset = start_offset, start_at, unit = unit.id(), "unit scheduled");
        self.unit_id = Some(unit.id());
        self.unit = Some(unit);
        self.offset_secs = start_offset;
        self.clock_anchor = start_at;
        self.manual_stop = false;
        self.playing = true;
        self.emit(PlaybackEvent::Started {
            offset_secs: start_offset,
        });
        Ok(())
    }

    /// Pause playback, banking the elapsed play time into the offset.
    ///
    /// Idempotent: pausing while not playing is a no-op. Pausing before the
    /// scheduling delay has elapsed banks nothing (elapsed clamps to 0).
    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }

        self.manual_stop = true;
        let elapsed = (self.sink.clock_seconds() - self.clock_anchor).max(0.0);
        self.offset_secs = (self.offset_secs + elapsed).min(self.duration_secs());
        if let Some(mut unit) = self.unit.take() {
            unit.stop();
        }
        self.playing = false;
        self.emit(PlaybackEvent::Paused {
            offset_secs: self.offset_secs,
        });
    }

    /// Continue from the stored offset.
    pub fn resume(&mut self) -> Result<()> {
        self.play(self.offset_secs)
    }

    /// Restart from the beginning, discarding any stored offset.
    pub fn restart(&mut self) -> Result<()> {
        self.play(0.0)
    }

    /// Handle a unit completion message.
    ///
    /// Only a message for the current unit is acted on; anything else is a
    /// late echo from a replaced unit. A natural end (no manual stop) resets
    /// the offset to 0 — after a manual stop the pause-computed offset is
    /// authoritative and must not be touched.
    pub fn on_unit_ended(&mut self, id: UnitId) {
        if self.unit_id != Some(id) {
            debug!(unit = id, "ignoring completion from stale unit");
            return;
        }
        self.unit_id = None;
        self.unit = None;

        if self.manual_stop {
            return;
        }

        self.offset_secs = 0.0;
        self.playing = false;
        self.emit(PlaybackEvent::Completed);
    }

    /// Stop playback for teardown.
    ///
    /// Marks the stop as manual so a completion message arriving afterwards
    /// cannot reset state that the host has already read.
    pub fn stop(&mut self) {
        self.halt_unit();
        self.playing = false;
    }

    fn halt_unit(&mut self) {
        self.manual_stop = true;
        if let Some(mut unit) = self.unit.take() {
            unit.stop();
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is not a failure.
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }
}

impl Drop for NarrationPlayer {
    fn drop(&mut self) {
        if self.unit.is_some() {
            warn!("player dropped with an active unit; stopping it");
        }
        self.halt_unit();
    }
}
