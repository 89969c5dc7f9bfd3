//! Audio Output Abstraction
//!
//! Shared PCM types plus the sound-producing-unit boundary the playback
//! controller drives. Hosts implement [`AudioSink`] on top of their audio
//! engine (the desktop bridge uses cpal); the core never talks to an audio
//! device directly.

use crate::error::Result;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Fixed PCM wire format of a narration payload.
///
/// The synthesis backend always returns 16-bit signed little-endian mono at
/// 24 kHz; the format is constant for the application lifetime and never
/// negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmSpec {
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Number of audio channels.
    pub channels: u16,
}

impl PcmSpec {
    /// Bits per sample of the wire format.
    pub const BITS_PER_SAMPLE: u16 = 16;

    /// The narration wire format: 24 kHz mono.
    pub fn narration() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
        }
    }

    /// Bytes occupied by one frame (one sample per channel).
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (Self::BITS_PER_SAMPLE as usize / 8)
    }
}

impl Default for PcmSpec {
    fn default() -> Self {
        Self::narration()
    }
}

/// Decoded audio: one f32 sample plane per channel, samples in [-1.0, 1.0].
///
/// Immutable after creation; shared between the controller and the sink as
/// `Arc<PcmBuffer>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    planes: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Create a buffer from channel planes.
    ///
    /// All planes must have equal length; a mismatch is a programming error
    /// in the decoder, not a runtime condition.
    pub fn new(planes: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(
            planes.windows(2).all(|w| w[0].len() == w[1].len()),
            "channel planes must have equal length"
        );
        Self {
            planes,
            sample_rate,
        }
    }

    /// An empty mono buffer at the given rate.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(vec![Vec::new()], sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.planes.len() as u16
    }

    /// Number of frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.planes.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Samples of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channels()`.
    pub fn plane(&self, channel: u16) -> &[f32] {
        &self.planes[channel as usize]
    }

    /// Total duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Identifier of a sound-producing unit, unique within a sink's lifetime.
///
/// Ids are monotonically increasing so a completion message from an already
/// replaced unit can be recognized as stale and discarded.
pub type UnitId = u64;

/// A live sound-producing unit.
///
/// One-shot: bound to one buffer and one start call; it can only be stopped
/// and replaced, never restarted. Dropping the handle stops the unit.
pub trait SoundUnit: Send {
    /// The unit's identifier.
    fn id(&self) -> UnitId;

    /// Stop emitting sound. Idempotent; stopping suppresses no completion
    /// message, the consumer distinguishes manual stops itself.
    fn stop(&mut self);
}

/// Platform audio output.
///
/// The sink owns the process-wide audio clock and produces sound units on
/// demand. All methods must be fast and non-blocking: they are called from
/// the controller's event-handling path, never from the audio thread.
pub trait AudioSink: Send + Sync {
    /// Wake the audio subsystem before playback.
    ///
    /// Platform autoplay or power policies may suspend the output device;
    /// this is the explicit resume step performed before every start. A
    /// failure surfaces as a playback-start failure to the caller, with no
    /// retry at this layer.
    fn resume(&self) -> Result<()>;

    /// Current audio-clock time in seconds.
    ///
    /// Monotonically increasing, independent of the UI event loop; read-only
    /// from the caller's perspective.
    fn clock_seconds(&self) -> f64;

    /// Create and schedule exactly one new sound unit.
    ///
    /// The unit plays `buffer` from `offset_secs` starting at absolute clock
    /// time `start_at`. The sink does not stop previously created units;
    /// serializing units is the controller's job.
    fn start_unit(
        &self,
        buffer: Arc<PcmBuffer>,
        start_at: f64,
        offset_secs: f64,
    ) -> Result<Box<dyn SoundUnit>>;

    /// Subscribe to unit completion messages.
    ///
    /// A unit's id is broadcast exactly once when the unit stops producing
    /// sound — because it reached the end of its buffer, was stopped, or was
    /// displaced by a newer unit. Consumers must treat ids that no longer
    /// match their current unit as stale.
    fn completions(&self) -> broadcast::Receiver<UnitId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narration_spec_is_24khz_mono() {
        let spec = PcmSpec::narration();
        assert_eq!(spec.sample_rate, 24_000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bytes_per_frame(), 2);
    }

    #[test]
    fn buffer_duration_from_frames() {
        let buffer = PcmBuffer::new(vec![vec![0.0; 48_000]], 24_000);
        assert_eq!(buffer.frames(), 48_000);
        assert_eq!(buffer.channels(), 1);
        assert!((buffer.duration_secs() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_buffer_has_zero_duration() {
        let buffer = PcmBuffer::empty(24_000);
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration_secs(), 0.0);
    }
}
