//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the narration core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be provided differently per platform:
//!
//! - [`HttpClient`](http::HttpClient) — async HTTP for the narration backend
//! - [`SettingsStore`](storage::SettingsStore) — key-value persistence for
//!   archive and session blobs
//! - [`AudioSink`](audio::AudioSink) / [`SoundUnit`](audio::SoundUnit) —
//!   audio clock and sound-producing units
//! - [`NarrationProvider`](narration::NarrationProvider) — lyrics + speech
//!   synthesis boundary
//! - [`Clock`](time::Clock) — wall-clock source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) — forward structured logs to the host
//!
//! The desktop implementations live in `bridge-desktop`.
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive [`BridgeError::NotAvailable`] when
//! a required capability is missing, rather than degrading silently.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks.

pub mod audio;
pub mod error;
pub mod http;
pub mod narration;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::{AudioSink, PcmBuffer, PcmSpec, SoundUnit, UnitId};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use narration::{NarrationError, NarrationProvider};
pub use storage::SettingsStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
