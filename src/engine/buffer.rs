//! Decoded Audio Buffer
//!
//! Non-interleaved 32-bit float samples at the source's native sample rate.
//! A buffer never changes shape after construction: every channel has the
//! same length, and channel count and sample rate are fixed.

use crate::error::{Result, SpliceError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Convert a time in seconds to a sample count at `sample_rate`
///
/// Rounds to the nearest sample; negative times map to zero.
#[inline]
pub fn secs_to_samples(secs: f64, sample_rate: u32) -> usize {
    (secs * sample_rate as f64).round().max(0.0) as usize
}

/// Calculate the peak level of an audio buffer in dB
///
/// Returns -f32::INFINITY for empty or silent buffers.
pub fn calculate_peak(buffer: &AudioBuffer) -> f32 {
    let peak = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max);

    linear_to_db(peak)
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Decoded multi-channel audio
///
/// # Example
/// ```
/// use audiosplice::engine::AudioBuffer;
///
/// // One second of stereo silence at 44.1kHz
/// let buffer = AudioBuffer::silent(44100, 2, 44100).unwrap();
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 44100);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zero-filled buffer
    ///
    /// # Arguments
    /// * `num_samples` - Number of samples per channel
    /// * `channels` - Number of channels (at least 1)
    /// * `sample_rate` - Sample rate in Hz (non-zero)
    pub fn silent(num_samples: usize, channels: usize, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![vec![0.0_f32; num_samples]; channels], sample_rate)
    }

    /// Build a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// `InvalidBuffer` if there are no channels, the sample rate is zero, or
    /// the channels differ in length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(SpliceError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        }
        if sample_rate == 0 {
            return Err(SpliceError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }

        let len = samples[0].len();
        if let Some((ch, other)) = samples.iter().enumerate().find(|(_, c)| c.len() != len) {
            return Err(SpliceError::InvalidBuffer {
                reason: format!(
                    "channel {} has {} samples, channel 0 has {}",
                    ch,
                    other.len(),
                    len
                ),
            });
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `channels` - Number of interleaved channels
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(SpliceError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        }

        if interleaved.len() % channels != 0 {
            return Err(SpliceError::InvalidBuffer {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
            });
        }

        let num_samples = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(num_samples); channels];

        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::from_channels(samples, sample_rate)
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channels() * self.len());

        for sample_idx in 0..self.len() {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Check whether two buffers can be concatenated
    pub fn same_format(&self, other: &AudioBuffer) -> bool {
        self.sample_rate == other.sample_rate && self.channels() == other.channels()
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Mutable channel access for the engine; length stays fixed
    #[inline]
    pub(crate) fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Iterate over channels
    pub fn iter_channels(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.iter().map(|c| c.as_slice())
    }

    /// Get a sample at the specified channel and index
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Consume the buffer, returning the channel data
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.samples
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_to_db() {
        assert!((linear_to_db(1.0) - 0.0).abs() < 1e-6);
        assert!((linear_to_db(0.5) - (-6.0206)).abs() < 1e-3);
        assert!(linear_to_db(0.0).is_infinite() && linear_to_db(0.0).is_sign_negative());
    }

    #[test]
    fn test_secs_to_samples_rounds() {
        assert_eq!(secs_to_samples(1.0, 44100), 44100);
        assert_eq!(secs_to_samples(0.5, 44100), 22050);
        // 0.00001s * 44100 = 0.441 -> 0
        assert_eq!(secs_to_samples(0.00001, 44100), 0);
        // 0.00002s * 44100 = 0.882 -> 1
        assert_eq!(secs_to_samples(0.00002, 44100), 1);
        assert_eq!(secs_to_samples(-1.0, 44100), 0);
    }

    #[test]
    fn test_calculate_peak() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.0, -0.5, 0.25]], 8000).unwrap();
        assert!((calculate_peak(&buffer) - (-6.0206)).abs() < 1e-3);

        let silent = AudioBuffer::silent(10, 1, 8000).unwrap();
        assert!(calculate_peak(&silent).is_infinite());
    }

    #[test]
    fn test_from_channels_rejects_unequal_lengths() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 44100);
        assert!(matches!(result, Err(SpliceError::InvalidBuffer { .. })));
    }

    #[test]
    fn test_from_channels_rejects_zero_rate_and_no_channels() {
        assert!(AudioBuffer::from_channels(vec![vec![0.0; 4]], 0).is_err());
        assert!(AudioBuffer::from_channels(Vec::new(), 44100).is_err());
    }

    #[test]
    fn test_buffer_duration() {
        let buffer = AudioBuffer::silent(22050, 1, 44100).unwrap();
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_buffer_from_interleaved_stereo() {
        let interleaved = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let buffer = AudioBuffer::from_interleaved(&interleaved, 2, 44100).unwrap();

        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.channel(0), &[0.1, 0.3, 0.5]);
        assert_eq!(buffer.channel(1), &[0.2, 0.4, 0.6]);
        assert_eq!(buffer.to_interleaved(), interleaved);
    }

    #[test]
    fn test_buffer_from_interleaved_invalid() {
        let result = AudioBuffer::from_interleaved(&[0.1, 0.2, 0.3], 2, 44100);
        assert!(result.is_err());
    }

    #[test]
    fn test_same_format() {
        let a = AudioBuffer::silent(10, 2, 44100).unwrap();
        let b = AudioBuffer::silent(99, 2, 44100).unwrap();
        let c = AudioBuffer::silent(10, 2, 48000).unwrap();
        let d = AudioBuffer::silent(10, 1, 44100).unwrap();
        assert!(a.same_format(&b));
        assert!(!a.same_format(&c));
        assert!(!a.same_format(&d));
    }

    #[test]
    fn test_get_sample_bounds() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.5, 0.25]], 8000).unwrap();
        assert_eq!(buffer.get_sample(0, 1), Some(0.25));
        assert_eq!(buffer.get_sample(0, 2), None);
        assert_eq!(buffer.get_sample(1, 0), None);
    }
}
