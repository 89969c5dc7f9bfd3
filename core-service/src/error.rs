use bridge_traits::narration::NarrationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    /// A playback or export operation was requested with no narration
    /// available anywhere (no buffer, no article text).
    #[error("No narration available")]
    NoNarrationLoaded,

    /// A save was requested before any lyrics were composed.
    #[error("No lyrics composed yet")]
    NoLyricsComposed,

    #[error("Narration error: {0}")]
    Narration(#[from] NarrationError),

    #[error("Audio error: {0}")]
    Audio(#[from] core_audio::AudioError),

    #[error("Archive error: {0}")]
    Archive(#[from] core_archive::ArchiveError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

impl CoreError {
    /// Returns `true` if re-running the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CoreError::Narration(e) => e.is_retryable(),
            // Autoplay-style refusals clear on the next direct interaction.
            CoreError::Audio(e) => e.is_playback_error(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
