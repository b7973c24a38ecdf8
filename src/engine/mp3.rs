//! MP3 encoding through an injected encoder capability
//!
//! The crate does not ship an MP3 encoder of its own. Callers hand in an
//! [`Mp3Capability`]; without one, encoding fails with
//! [`SpliceError::EncoderUnavailable`] instead of producing some other
//! format.

use log::debug;

use crate::engine::buffer::AudioBuffer;
use crate::engine::wav::f32_to_pcm16;
use crate::error::{Result, SpliceError};

/// One open encoding stream
pub trait Mp3Stream {
    /// Encode one block of samples per channel
    ///
    /// `right` is `None` for mono streams.
    fn encode_block(&mut self, left: &[i16], right: Option<&[i16]>) -> Result<Vec<u8>>;

    /// Emit whatever the encoder still holds
    fn flush(&mut self) -> Result<Vec<u8>>;
}

/// Factory for MP3 encoding streams
pub trait Mp3Capability: Send + Sync {
    /// Open a stream for the given layout
    fn open(&self, channels: usize, sample_rate: u32, bitrate_kbps: u32)
        -> Result<Box<dyn Mp3Stream>>;
}

/// Encode a buffer to MP3 in fixed-size blocks
///
/// # Arguments
/// * `buffer` - Mono or stereo audio
/// * `capability` - Encoder to use; `None` means no encoder is installed
/// * `bitrate_kbps` - Target bitrate
/// * `block_size` - Samples per channel per encoder call (1152 per MP3 frame)
///
/// # Errors
/// * `EncoderUnavailable` - No capability was supplied
/// * `UnsupportedFormat` - More than two channels
/// * `EncodeFailed` - The encoder rejected the input
pub fn encode_mp3(
    buffer: &AudioBuffer,
    capability: Option<&dyn Mp3Capability>,
    bitrate_kbps: u32,
    block_size: usize,
) -> Result<Vec<u8>> {
    let capability = capability.ok_or(SpliceError::EncoderUnavailable)?;

    if buffer.channels() > 2 {
        return Err(SpliceError::UnsupportedFormat {
            format: format!("{}-channel MP3 (only mono/stereo)", buffer.channels()),
        });
    }
    if block_size == 0 {
        return Err(SpliceError::EncodeFailed {
            reason: "block size must be non-zero".to_string(),
        });
    }

    let pcm: Vec<Vec<i16>> = buffer
        .iter_channels()
        .map(|ch| ch.iter().map(|&s| f32_to_pcm16(s)).collect())
        .collect();

    let mut stream = capability.open(buffer.channels(), buffer.sample_rate(), bitrate_kbps)?;
    let mut out = Vec::new();
    let mut blocks = 0usize;

    let mut start = 0;
    while start < buffer.len() {
        let end = (start + block_size).min(buffer.len());
        let left = &pcm[0][start..end];
        let right = pcm.get(1).map(|ch| &ch[start..end]);
        out.extend(stream.encode_block(left, right)?);
        blocks += 1;
        start = end;
    }
    out.extend(stream.flush()?);

    debug!("Encoded {} MP3 blocks into {} bytes", blocks, out.len());
    Ok(out)
}

#[cfg(feature = "lame")]
pub use lame::LameCapability;

#[cfg(feature = "lame")]
mod lame {
    use mp3lame_encoder::{Bitrate, Builder, DualPcm, Encoder, FlushNoGap, MonoPcm, Quality};

    use super::{Mp3Capability, Mp3Stream};
    use crate::error::{Result, SpliceError};

    fn encode_err(reason: impl std::fmt::Debug) -> SpliceError {
        SpliceError::EncodeFailed {
            reason: format!("{:?}", reason),
        }
    }

    fn bitrate(kbps: u32) -> Bitrate {
        match kbps {
            0..=96 => Bitrate::Kbps96,
            97..=128 => Bitrate::Kbps128,
            129..=160 => Bitrate::Kbps160,
            161..=192 => Bitrate::Kbps192,
            193..=256 => Bitrate::Kbps256,
            _ => Bitrate::Kbps320,
        }
    }

    /// MP3 encoding backed by LAME
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LameCapability;

    struct LameStream {
        encoder: Encoder,
    }

    impl Mp3Capability for LameCapability {
        fn open(
            &self,
            channels: usize,
            sample_rate: u32,
            bitrate_kbps: u32,
        ) -> Result<Box<dyn Mp3Stream>> {
            let mut builder = Builder::new().ok_or_else(|| SpliceError::EncodeFailed {
                reason: "failed to allocate LAME encoder".to_string(),
            })?;
            builder.set_num_channels(channels as u8).map_err(encode_err)?;
            builder.set_sample_rate(sample_rate).map_err(encode_err)?;
            builder.set_brate(bitrate(bitrate_kbps)).map_err(encode_err)?;
            builder.set_quality(Quality::Good).map_err(encode_err)?;
            let encoder = builder.build().map_err(encode_err)?;
            Ok(Box::new(LameStream { encoder }))
        }
    }

    impl Mp3Stream for LameStream {
        fn encode_block(&mut self, left: &[i16], right: Option<&[i16]>) -> Result<Vec<u8>> {
            let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(left.len()));
            match right {
                Some(right) => self.encoder.encode_to_vec(DualPcm { left, right }, &mut out),
                None => self.encoder.encode_to_vec(MonoPcm(left), &mut out),
            }
            .map_err(encode_err)?;
            Ok(out)
        }

        fn flush(&mut self) -> Result<Vec<u8>> {
            // LAME holds back at most 7200 bytes
            let mut out = Vec::with_capacity(7200);
            self.encoder
                .flush_to_vec::<FlushNoGap>(&mut out)
                .map_err(encode_err)?;
            Ok(out)
        }
    }
}
