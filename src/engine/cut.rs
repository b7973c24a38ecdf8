//! Cut engine
//!
//! Copies the material selected by a segment list into one new buffer.

use log::info;

use crate::engine::buffer::{secs_to_samples, AudioBuffer};
use crate::engine::segment::Segment;
use crate::error::{Result, SpliceError};

/// Concatenate the selected ranges of `buffer` in start order
///
/// Segments are stably sorted by start time. Each segment contributes
/// `round(duration * sample_rate)` samples, rounded per segment, read from
/// `round(start * sample_rate)`. Reads past the end of the source leave
/// silence in the output.
///
/// # Errors
/// * `NoSegments` - `segments` is empty
pub fn cut_segments(buffer: &AudioBuffer, segments: &[Segment]) -> Result<AudioBuffer> {
    if segments.is_empty() {
        return Err(SpliceError::NoSegments);
    }

    let rate = buffer.sample_rate();
    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by(|a, b| a.start().total_cmp(&b.start()));

    let lengths: Vec<usize> = ordered
        .iter()
        .map(|s| secs_to_samples(s.duration(), rate))
        .collect();
    let total: usize = lengths.iter().sum();

    let mut output = AudioBuffer::silent(total, buffer.channels(), rate)?;
    let mut offset = 0;

    for (segment, &length) in ordered.iter().zip(&lengths) {
        let src_start = secs_to_samples(segment.start(), rate).min(buffer.len());
        let available = length.min(buffer.len() - src_start);

        for ch in 0..buffer.channels() {
            output.channel_mut(ch)[offset..offset + available]
                .copy_from_slice(&buffer.channel(ch)[src_start..src_start + available]);
        }
        offset += length;
    }

    info!(
        "Cut {} segments into {} samples ({:.3}s)",
        segments.len(),
        output.len(),
        output.duration_secs()
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, channels: usize, rate: u32) -> AudioBuffer {
        let data = (0..channels)
            .map(|ch| {
                (0..len)
                    .map(|i| (i as f32 / len as f32) * if ch == 0 { 1.0 } else { -1.0 })
                    .collect()
            })
            .collect();
        AudioBuffer::from_channels(data, rate).unwrap()
    }

    fn seg(start: f64, end: f64) -> Segment {
        Segment::new(start, end).unwrap()
    }

    #[test]
    fn test_no_segments() {
        let buffer = ramp(100, 1, 100);
        assert!(matches!(
            cut_segments(&buffer, &[]),
            Err(SpliceError::NoSegments)
        ));
    }

    #[test]
    fn test_three_segment_scenario() {
        let buffer = ramp(30 * 44100, 1, 44100);
        let segments = [seg(0.0, 5.0), seg(10.0, 12.0), seg(20.0, 21.0)];

        let output = cut_segments(&buffer, &segments).unwrap();
        assert_eq!(output.len(), 352_800);
        assert_eq!(output.sample_rate(), 44100);
        assert_eq!(output.channel(0)[0], buffer.channel(0)[0]);
        // Second segment starts right after the first
        assert_eq!(output.channel(0)[220_500], buffer.channel(0)[441_000]);
        assert_eq!(output.channel(0)[308_700], buffer.channel(0)[882_000]);
    }

    #[test]
    fn test_unsorted_segments_are_ordered_by_start() {
        let buffer = ramp(1000, 2, 100);
        let output = cut_segments(&buffer, &[seg(5.0, 6.0), seg(1.0, 2.0)]).unwrap();

        assert_eq!(output.len(), 200);
        assert_eq!(output.channels(), 2);
        assert_eq!(&output.channel(0)[..100], &buffer.channel(0)[100..200]);
        assert_eq!(&output.channel(0)[100..], &buffer.channel(0)[500..600]);
        assert_eq!(&output.channel(1)[100..], &buffer.channel(1)[500..600]);
    }

    #[test]
    fn test_rounding_is_per_segment() {
        // 0.016s at 100 Hz = 1.6 samples -> 2 per segment, not round(4.8)
        let buffer = ramp(1000, 1, 100);
        let segments = [seg(0.0, 0.016), seg(1.0, 1.016), seg(2.0, 2.016)];
        let output = cut_segments(&buffer, &segments).unwrap();
        assert_eq!(output.len(), 6);
    }

    #[test]
    fn test_read_past_end_is_silent() {
        let buffer = AudioBuffer::from_channels(vec![vec![1.0; 100]], 100).unwrap();
        // round(0.996 * 100) = 100 -> start at the last sample boundary
        let output = cut_segments(&buffer, &[seg(0.996, 1.5)]).unwrap();
        assert_eq!(output.len(), 50);
        assert!(output.channel(0).iter().all(|&s| s == 0.0));
    }
}
