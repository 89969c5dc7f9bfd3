//! Error types for the Gemini narration provider.

use bridge_traits::narration::NarrationError;
use thiserror::Error;

/// Gemini provider errors.
#[derive(Error, Debug)]
pub enum GeminiError {
    /// Request quota exhausted (HTTP 429 / RESOURCE_EXHAUSTED).
    #[error("Gemini quota exceeded")]
    QuotaExceeded,

    /// API key rejected or lacking access (HTTP 403).
    #[error("Gemini permission denied")]
    PermissionDenied,

    /// Backend-side failure (HTTP 5xx), surfaced after retries.
    #[error("Gemini backend error (status {status_code}): {message}")]
    Backend { status_code: u16, message: String },

    /// Any other non-success status; not retried.
    #[error("Gemini API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse or interpret an otherwise successful response.
    #[error("Failed to parse Gemini response: {0}")]
    ParseError(String),

    /// Transport-level bridge failure.
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Gemini operations.
pub type Result<T> = std::result::Result<T, GeminiError>;

impl From<GeminiError> for NarrationError {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::QuotaExceeded => NarrationError::QuotaExceeded,
            GeminiError::PermissionDenied => NarrationError::PermissionDenied,
            GeminiError::Backend {
                status_code,
                message,
            } => NarrationError::Backend(format!("status {}: {}", status_code, message)),
            GeminiError::ApiError {
                status_code,
                message,
            } => NarrationError::InvalidResponse(format!("status {}: {}", status_code, message)),
            GeminiError::ParseError(msg) => NarrationError::InvalidResponse(msg),
            GeminiError::BridgeError(e) => NarrationError::Transport(e.to_string()),
        }
    }
}
