//! # WAV Encoder
//!
//! Serializes a [`PcmBuffer`] into a complete, self-contained 16-bit PCM WAV
//! file for download. The container is the canonical 44-byte
//! RIFF/WAVE/fmt/data layout; output length is exactly
//! `44 + frames * channels * 2`.

use bridge_traits::audio::PcmBuffer;
use bytes::Bytes;

/// Length of the canonical 16-bit PCM WAV header.
pub const WAV_HEADER_LEN: usize = 44;

/// Encode a buffer as a WAV byte sequence.
///
/// There is no error path: a zero-frame buffer produces a valid 44-byte
/// header-only file.
pub fn encode_wav(buffer: &PcmBuffer) -> Bytes {
    let channels = buffer.channels().max(1);
    let frames = buffer.frames();
    let block_align = u32::from(channels) * 2;
    let data_len = frames as u32 * block_align;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(data_len + 36).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk: PCM, channel count, rates, alignment, bit depth
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate().to_le_bytes());
    out.extend_from_slice(&(buffer.sample_rate() * block_align).to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());

    // data chunk, interleaved frames
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for frame in 0..frames {
        for ch in 0..buffer.channels() {
            let sample = buffer.plane(ch)[frame].clamp(-1.0, 1.0);
            // Asymmetric scale: the full negative range is used while the
            // positive side stays below i16::MAX. Round-trip error is at
            // most one quantization step either way.
            let quantized = if sample < 0.0 {
                (sample * 32768.0) as i16
            } else {
                (sample * 32767.0) as i16
            };
            out.extend_from_slice(&quantized.to_le_bytes());
        }
    }

    Bytes::from(out)
}
