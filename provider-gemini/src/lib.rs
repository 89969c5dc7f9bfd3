//! # Gemini Narration Provider
//!
//! Implements the `NarrationProvider` trait against the Gemini
//! `generateContent` REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Sung-verse lyrics composition via a text model
//! - Speech synthesis via a TTS model with a prebuilt voice, returning
//!   base64-encoded raw PCM in the fixed narration wire format
//! - Two-attempt retry with exponential backoff on backend-side failures
//! - A [`MockNarrator`] demo fallback producing lyrics but no audio

pub mod connector;
pub mod error;
pub mod mock;
pub mod types;

pub use connector::GeminiNarrator;
pub use error::{GeminiError, Result};
pub use mock::MockNarrator;
