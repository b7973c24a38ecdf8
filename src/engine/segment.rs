//! Segment model for the cutter
//!
//! A [`SegmentList`] holds `[start, end)` ranges over one decoded buffer.
//! The list is pairwise non-overlapping after every accepted mutation; a
//! rejected mutation leaves it exactly as it was.

use std::fmt;

use log::{debug, warn};

use crate::error::{Result, SpliceError};

/// A time range in seconds over a decoded buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    start: f64,
    end: f64,
}

impl Segment {
    /// Create a segment; requires `0 <= start < end`
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !(start.is_finite() && end.is_finite()) {
            return Err(SpliceError::InvalidSegment {
                reason: format!("bounds must be finite (start {}, end {})", start, end),
            });
        }
        if start < 0.0 || start >= end {
            return Err(SpliceError::InvalidSegment {
                reason: format!("start {:.3}s must be >= 0 and before end {:.3}s", start, end),
            });
        }
        Ok(Self { start, end })
    }

    /// Start time in seconds
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End time in seconds (exclusive)
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length in seconds, always `end - start`
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True if the two ranges share any time
    #[inline]
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end)
    }
}

/// Check a whole list for any overlapping pair
pub fn has_overlap(segments: &[Segment]) -> bool {
    segments
        .iter()
        .enumerate()
        .any(|(i, a)| segments[i + 1..].iter().any(|b| a.overlaps(b)))
}

/// Which bound of a segment an edit moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentBound {
    Start,
    End,
}

/// Editable, validated list of segments with a preview selection
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentList {
    segments: Vec<Segment>,
    selected: Option<usize>,
    /// Duration of the buffer the segments refer to
    audio_duration: f64,
    default_length: f64,
    min_gap: f64,
}

impl SegmentList {
    /// Create an empty list over a buffer of `audio_duration` seconds
    ///
    /// # Arguments
    /// * `default_length` - Length of segments created by [`add_at_time`](Self::add_at_time)
    /// * `min_gap` - Minimum distance between a segment's start and end
    pub fn new(audio_duration: f64, default_length: f64, min_gap: f64) -> Self {
        Self {
            segments: Vec::new(),
            selected: None,
            audio_duration,
            default_length,
            min_gap,
        }
    }

    /// Segments in entry order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Duration of the underlying buffer
    pub fn audio_duration(&self) -> f64 {
        self.audio_duration
    }

    /// Currently selected segment index
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Sum of all segment durations
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(Segment::duration).sum()
    }

    /// Add a segment `[t, min(t + default_length, duration)]`
    ///
    /// # Returns
    /// The index of the new segment
    ///
    /// # Errors
    /// * `InvalidSegment` - `t` is outside the buffer
    /// * `SegmentOverlap` - The new range overlaps an existing segment
    pub fn add_at_time(&mut self, t: f64) -> Result<usize> {
        if !t.is_finite() || t < 0.0 || t >= self.audio_duration {
            return Err(SpliceError::InvalidSegment {
                reason: format!(
                    "time {:.3}s is outside the audio (0s - {:.3}s)",
                    t, self.audio_duration
                ),
            });
        }

        let end = (t + self.default_length).min(self.audio_duration);
        let segment = Segment::new(t, end)?;

        if self.segments.iter().any(|s| s.overlaps(&segment)) {
            warn!("Rejected new segment {}: overlaps existing segment", segment);
            return Err(SpliceError::SegmentOverlap { start: t, end });
        }

        self.segments.push(segment);
        debug!("Added segment {} at index {}", segment, self.segments.len() - 1);
        Ok(self.segments.len() - 1)
    }

    /// Move one bound of segment `index`
    ///
    /// The proposed value is held at least `min_gap` away from the other
    /// bound and inside `[0, duration]`. If both cannot hold, the edit is
    /// rejected. The edited list is validated as a whole; on any violation
    /// nothing changes.
    pub fn update_bound(&mut self, index: usize, bound: SegmentBound, value: f64) -> Result<()> {
        let current = *self.get(index)?;
        if !value.is_finite() {
            return Err(SpliceError::InvalidSegment {
                reason: format!("bound must be finite, got {}", value),
            });
        }

        let (start, end) = match bound {
            SegmentBound::Start => {
                let start = value.min(current.end - self.min_gap).max(0.0);
                (start, current.end)
            }
            SegmentBound::End => {
                let end = value
                    .max(current.start + self.min_gap)
                    .min(self.audio_duration);
                (current.start, end)
            }
        };
        // Clamping to the audio can eat into the gap near either edge
        if end - start < self.min_gap - 1e-9 {
            warn!(
                "Rejected move of segment {} to [{:.3}s, {:.3}s): shorter than {:.3}s",
                index, start, end, self.min_gap
            );
            return Err(SpliceError::InvalidSegment {
                reason: format!(
                    "segment must be at least {:.3}s long, [{:.3}s, {:.3}s) is not",
                    self.min_gap, start, end
                ),
            });
        }
        let updated = Segment::new(start, end)?;

        let mut proposed = self.segments.clone();
        proposed[index] = updated;
        if has_overlap(&proposed) {
            warn!(
                "Rejected move of segment {} to {}: would overlap",
                index, updated
            );
            return Err(SpliceError::SegmentOverlap { start, end });
        }

        self.segments = proposed;
        debug!("Segment {} is now {}", index, updated);
        Ok(())
    }

    /// Remove segment `index`, keeping the selection on the same segment
    pub fn remove(&mut self, index: usize) -> Result<Segment> {
        self.get(index)?;
        let removed = self.segments.remove(index);

        self.selected = match self.selected {
            Some(sel) if sel == index => None,
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };

        debug!("Removed segment {} {}", index, removed);
        Ok(removed)
    }

    /// Select segment `index` for preview
    pub fn select(&mut self, index: usize) -> Result<&Segment> {
        self.get(index)?;
        self.selected = Some(index);
        Ok(&self.segments[index])
    }

    /// Drop the preview selection
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Remove every segment
    pub fn clear(&mut self) {
        self.segments.clear();
        self.selected = None;
    }

    /// Get segment `index`
    pub fn get(&self, index: usize) -> Result<&Segment> {
        self.segments
            .get(index)
            .ok_or(SpliceError::SegmentOutOfRange {
                index,
                len: self.segments.len(),
            })
    }
}
