//! # Audio Error Types
//!
//! Error taxonomy for the decode/encode/playback pipeline.

use thiserror::Error;

/// Errors that can occur in the audio pipeline.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The narration payload could not be decoded into a buffer. The caller
    /// treats this as "audio unavailable"; no partial buffer is produced.
    #[error("Audio payload decode failed: {0}")]
    DecodeFailed(String),

    /// The audio subsystem refused to start playback (e.g., suspended by a
    /// platform autoplay policy). Not retried at this layer; the host must
    /// re-attempt from a direct user interaction.
    #[error("Playback failed to start: {0}")]
    PlaybackFailed(String),

    /// A playback operation was requested with no narration loaded.
    #[error("No narration loaded")]
    NoBufferLoaded,

    /// Failure reported by a host bridge.
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

impl AudioError {
    /// Returns `true` if the error means the payload itself was unusable.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, AudioError::DecodeFailed(_))
    }

    /// Returns `true` if a direct user interaction may unblock the
    /// operation (platform autoplay policies).
    pub fn is_playback_error(&self) -> bool {
        matches!(
            self,
            AudioError::PlaybackFailed(_) | AudioError::Bridge(_)
        )
    }
}

/// Result type for audio operations.
pub type Result<T> = std::result::Result<T, AudioError>;
