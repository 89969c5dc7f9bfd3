//! # Core Configuration Module
//!
//! Settings for the narration pipeline and playback tuning. Trait-object
//! dependencies (HTTP client, settings store, audio sink) are bundled at the
//! service layer; this module holds the plain, serializable knobs with
//! fail-fast validation.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::default()
//!     .with_voice("Kore")
//!     .with_gain(1.4);
//! config.validate().expect("invalid configuration");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the generative narration backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Model used to compose sung-verse lyrics from article text.
    pub lyrics_model: String,

    /// Model used to synthesize lyrics as speech.
    pub speech_model: String,

    /// Prebuilt voice name passed in the speech request.
    pub voice: String,

    /// Total attempts per backend call (first try included).
    pub max_attempts: u32,

    /// Base delay for the exponential backoff applied between attempts.
    ///
    /// Only backend-side (5xx/INTERNAL) failures are retried; the delay for
    /// attempt `n` is `backoff_base * 2^n`.
    pub backoff_base: Duration,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            lyrics_model: "gemini-3-flash-preview".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            max_attempts: 2,
            backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl NarrationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lyrics_model.is_empty() || self.speech_model.is_empty() {
            return Err(Error::Config(
                "narration model names must not be empty".to_string(),
            ));
        }
        if self.voice.is_empty() {
            return Err(Error::Config("voice name must not be empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(Error::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "request_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Playback tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Fixed scheduling delay before a sound unit starts, in seconds.
    ///
    /// Absorbs audio-subsystem wake-up latency; the clock anchor is recorded
    /// at `now + start_delay_secs` so pause math stays exact.
    pub start_delay_secs: f64,

    /// Voice gain applied by the sink to the narration channel.
    pub gain: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            start_delay_secs: 0.1,
            gain: 1.4,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.start_delay_secs >= 0.0) {
            return Err(Error::Config(
                "start_delay_secs must be non-negative".to_string(),
            ));
        }
        if !(self.gain > 0.0 && self.gain <= 4.0) {
            return Err(Error::Config(format!(
                "gain {} outside supported range (0, 4]",
                self.gain
            )));
        }
        Ok(())
    }
}

/// Top-level settings for the narration core.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    pub narration: NarrationConfig,
    pub playback: PlaybackConfig,
}

impl CoreConfig {
    /// Set the prebuilt voice name.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.narration.voice = voice.into();
        self
    }

    /// Set the lyrics model.
    pub fn with_lyrics_model(mut self, model: impl Into<String>) -> Self {
        self.narration.lyrics_model = model.into();
        self
    }

    /// Set the speech model.
    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.narration.speech_model = model.into();
        self
    }

    /// Set attempts per backend call.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.narration.max_attempts = attempts;
        self
    }

    /// Set the playback voice gain.
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.playback.gain = gain;
        self
    }

    /// Set the playback scheduling delay.
    pub fn with_start_delay(mut self, secs: f64) -> Self {
        self.playback.start_delay_secs = secs;
        self
    }

    /// Validate every section, failing fast on the first problem.
    pub fn validate(&self) -> Result<()> {
        self.narration.validate()?;
        self.playback.validate()?;
        Ok(())
    }
}
