//! # PCM Decoder
//!
//! Converts a base64-encoded stream of 16-bit little-endian PCM samples into
//! a normalized floating-point [`PcmBuffer`]. This is the only decode path in
//! the system: the synthesis backend always returns the fixed narration wire
//! format ([`PcmSpec::narration`]), so there is no container probing and no
//! codec negotiation.

use crate::error::{AudioError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bridge_traits::audio::{PcmBuffer, PcmSpec};
use tracing::debug;

/// Decode a base64 narration payload into a normalized buffer.
///
/// Malformed base64 is surfaced as [`AudioError::DecodeFailed`]; no partial
/// buffer is produced.
pub fn decode_base64_pcm(payload: &str, spec: PcmSpec) -> Result<PcmBuffer> {
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| AudioError::DecodeFailed(format!("invalid base64: {}", e)))?;
    Ok(decode_pcm_bytes(&bytes, spec))
}

/// Reinterpret raw bytes as interleaved i16 LE samples and normalize.
///
/// A trailing partial sample is truncated; when the sample count is not a
/// multiple of the channel count, the remainder samples are dropped. Pure
/// transformation, no error path.
pub fn decode_pcm_bytes(bytes: &[u8], spec: PcmSpec) -> PcmBuffer {
    let channels = spec.channels.max(1) as usize;
    let sample_count = bytes.len() / 2;
    let frames = sample_count / channels;

    if sample_count * 2 != bytes.len() || frames * channels != sample_count {
        debug!(
            bytes = bytes.len(),
            frames, "dropping trailing partial frame from PCM payload"
        );
    }

    let mut planes = vec![Vec::with_capacity(frames); channels];
    for (ch, plane) in planes.iter_mut().enumerate() {
        for frame in 0..frames {
            let at = (frame * channels + ch) * 2;
            let sample = i16::from_le_bytes([bytes[at], bytes[at + 1]]);
            // Divide by 32768 so the integer range [-32768, 32767] maps onto
            // approximately [-1.0, 1.0].
            plane.push(f32::from(sample) / 32768.0);
        }
    }

    PcmBuffer::new(planes, spec.sample_rate)
}
