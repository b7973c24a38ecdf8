//! PCM WAV encoder
//!
//! Writes a canonical 44-byte RIFF/WAVE header followed by interleaved
//! 16-bit little-endian samples.

use crate::engine::buffer::AudioBuffer;
use crate::error::{Result, SpliceError};

/// Size of the canonical header
pub const WAV_HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: u16 = 2;
const PCM_FORMAT: u16 = 1;

/// Convert a float sample to signed 16-bit PCM
///
/// Samples are clamped to [-1, 1]. Negative values scale by 0x8000 and
/// non-negative values by 0x7FFF so +1.0 cannot overflow; the fraction is
/// truncated toward zero.
#[inline]
pub fn f32_to_pcm16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode a buffer as a 16-bit PCM WAV file
///
/// # Errors
/// Returns `EncodeFailed` when the channel count, byte rate or data size
/// does not fit the header's fixed-width fields.
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    let sample_rate = buffer.sample_rate();
    let channels = u16::try_from(buffer.channels())
        .map_err(|_| header_overflow(format!("{} channels", buffer.channels())))?;
    let block_align = channels
        .checked_mul(BYTES_PER_SAMPLE)
        .ok_or_else(|| header_overflow(format!("{} channels", channels)))?;
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| header_overflow(format!("byte rate at {} Hz", sample_rate)))?;
    let data_len = buffer
        .len()
        .checked_mul(usize::from(block_align))
        .ok_or_else(|| header_overflow(format!("{} frames", buffer.len())))?;
    let data_size = u32::try_from(data_len)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| header_overflow(format!("{} bytes of sample data", data_len)))?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len);

    // RIFF chunk descriptor
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(data_size + 36).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&(BYTES_PER_SAMPLE * 8).to_le_bytes());

    // data sub-chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    for frame in 0..buffer.len() {
        for channel in buffer.iter_channels() {
            out.extend_from_slice(&f32_to_pcm16(channel[frame]).to_le_bytes());
        }
    }

    Ok(out)
}

fn header_overflow(what: String) -> SpliceError {
    SpliceError::EncodeFailed {
        reason: format!("{} does not fit a WAV header", what),
    }
}
