//! # Audio Pipeline Module
//!
//! The capture-to-playback pipeline for narrations:
//! - Decoding a base64 16-bit LE PCM payload into a normalized buffer
//! - Driving play/pause/resume/restart against the real-time audio clock
//! - Re-encoding the buffer into a downloadable WAV container
//!
//! Decode and encode are synchronous, pure transformations over in-memory
//! arrays; the only asynchronous boundary in the system (the narration
//! request round-trip) lives upstream in `provider-gemini`/`core-service`.

pub mod error;
pub mod pcm;
pub mod player;
pub mod wav;

pub use error::{AudioError, Result};
pub use pcm::{decode_base64_pcm, decode_pcm_bytes};
pub use player::{NarrationPlayer, PlayerState};
pub use wav::{encode_wav, WAV_HEADER_LEN};

// The shared audio types live in bridge-traits; re-export for convenience.
pub use bridge_traits::audio::{PcmBuffer, PcmSpec, UnitId};
