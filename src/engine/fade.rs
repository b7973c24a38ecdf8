//! Linear fade envelopes

use crate::engine::buffer::{secs_to_samples, AudioBuffer};

/// Apply a linear fade-in and fade-out to every channel
///
/// The window is `round(fade_secs * sample_rate)` samples, clamped to the
/// buffer length. Sample `i` of the head is scaled by `i / F` and sample
/// `i` of the tail window by `1 - i / F`. On buffers shorter than two
/// windows the head and tail ranges overlap and both gains apply there.
///
/// # Returns
/// The window length actually used, in samples
pub fn apply_fade(buffer: &mut AudioBuffer, fade_secs: f64) -> usize {
    let len = buffer.len();
    let fade_len = secs_to_samples(fade_secs, buffer.sample_rate()).min(len);
    if fade_len == 0 {
        return 0;
    }

    let window = fade_len as f64;
    let tail_start = len - fade_len;

    for ch in 0..buffer.channels() {
        let samples = buffer.channel_mut(ch);
        for (i, sample) in samples[..fade_len].iter_mut().enumerate() {
            *sample *= (i as f64 / window) as f32;
        }
        for (i, sample) in samples[tail_start..].iter_mut().enumerate() {
            *sample *= (1.0 - i as f64 / window) as f32;
        }
    }

    fade_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ones(len: usize, channels: usize, rate: u32) -> AudioBuffer {
        AudioBuffer::from_channels(vec![vec![1.0; len]; channels], rate).unwrap()
    }

    #[test]
    fn test_fade_envelope_edges() {
        let mut buffer = ones(1000, 2, 100);
        let used = apply_fade(&mut buffer, 1.5);
        assert_eq!(used, 150);

        for ch in 0..2 {
            let s = buffer.channel(ch);
            assert_eq!(s[0], 0.0);
            assert_relative_eq!(s[149], 149.0 / 150.0, epsilon = 1e-6);
            assert_eq!(s[150], 1.0);
            assert_eq!(s[849], 1.0);
            assert_eq!(s[850], 1.0);
            assert_relative_eq!(s[999], 1.0 / 150.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fade_is_linear() {
        let mut buffer = ones(400, 1, 100);
        apply_fade(&mut buffer, 1.0);
        let s = buffer.channel(0);
        assert_relative_eq!(s[50], 0.5, epsilon = 1e-6);
        assert_relative_eq!(s[350], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_fade_window_clamped_on_short_buffer() {
        // 1.5s window on a 1s buffer: window becomes the whole buffer
        let mut buffer = ones(100, 1, 100);
        let used = apply_fade(&mut buffer, 1.5);
        assert_eq!(used, 100);

        let s = buffer.channel(0);
        for (i, &v) in s.iter().enumerate() {
            let expected = (i as f64 / 100.0) * (1.0 - i as f64 / 100.0);
            assert_relative_eq!(v as f64, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fade_on_empty_buffer() {
        let mut buffer = AudioBuffer::silent(0, 1, 44100).unwrap();
        assert_eq!(apply_fade(&mut buffer, 1.5), 0);
    }
}
