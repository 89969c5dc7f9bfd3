//! Narration Backend Abstraction
//!
//! The request/response boundary to the generative-AI backend that turns an
//! article into sung-verse lyrics and then into speech. Consumed as an opaque
//! collaborator: the core never sees prompts, models, or transport details.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a narration backend.
///
/// The taxonomy mirrors what the backend can actually report; the service
/// layer maps these onto user-facing messaging, so the distinction between
/// quota, permission, and transient backend trouble must survive the
/// boundary.
#[derive(Error, Debug)]
pub enum NarrationError {
    /// Request quota exhausted (HTTP 429 / RESOURCE_EXHAUSTED).
    #[error("Narration quota exceeded")]
    QuotaExceeded,

    /// API key rejected or lacking access (HTTP 403).
    #[error("Narration permission denied")]
    PermissionDenied,

    /// Backend-side failure (HTTP 5xx / INTERNAL). Retryable.
    #[error("Narration backend error: {0}")]
    Backend(String),

    /// Transport-level failure before a response was produced.
    #[error("Narration transport error: {0}")]
    Transport(String),

    /// Response arrived but could not be interpreted.
    #[error("Invalid narration response: {0}")]
    InvalidResponse(String),
}

impl NarrationError {
    /// Returns `true` if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NarrationError::Backend(_))
    }
}

pub type Result<T> = std::result::Result<T, NarrationError>;

/// Generative narration backend.
///
/// The two calls are made in sequence per narration: compose lyrics from the
/// article text, then synthesize the lyrics as speech.
#[async_trait]
pub trait NarrationProvider: Send + Sync {
    /// Compose stylized sung-verse lyrics from article text.
    async fn compose_lyrics(&self, article: &str) -> Result<String>;

    /// Synthesize lyrics as speech.
    ///
    /// Returns a base64-encoded raw PCM payload in the fixed narration wire
    /// format, or `Ok(None)` when no audio is available (demo fallback) —
    /// a terminal non-error state, not a decode failure.
    async fn synthesize(&self, lyrics: &str) -> Result<Option<String>>;
}
