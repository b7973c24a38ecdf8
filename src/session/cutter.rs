//! Cutter session
//!
//! One decoded file, the segments drawn over it, a preview player and the
//! most recent cut.

use std::time::Duration;

use log::info;

use crate::config::SpliceConfig;
use crate::engine::{
    cut_file_name, cut_segments, decode_audio, encode_wav, ArtifactHandle, ArtifactRegistry,
    AudioBuffer, AudioSource, OutputArtifact, OutputFormat, PlaybackTransport, PreviewPlayer,
    Segment, SegmentBound, SegmentList,
};
use crate::error::{Result, SpliceError};
use crate::session::InFlight;

/// State for cutting segments out of one file
#[derive(Debug)]
pub struct CutterSession {
    config: SpliceConfig,
    audio: Option<AudioBuffer>,
    /// Source file name without its extension
    base_name: Option<String>,
    segments: SegmentList,
    player: PreviewPlayer,
    output: Option<ArtifactHandle>,
    artifacts: ArtifactRegistry,
    in_flight: InFlight,
}

impl CutterSession {
    pub fn new(config: SpliceConfig) -> Self {
        let segments = Self::empty_segments(&config, 0.0);
        let player = PreviewPlayer::new(Duration::from_millis(config.poll_interval_ms));
        Self {
            config,
            audio: None,
            base_name: None,
            segments,
            player,
            output: None,
            artifacts: ArtifactRegistry::new(),
            in_flight: InFlight::new(),
        }
    }

    fn empty_segments(config: &SpliceConfig, duration: f64) -> SegmentList {
        SegmentList::new(
            duration,
            config.default_segment_secs,
            config.min_segment_gap_secs,
        )
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Decode `source` and make it the session's audio
    ///
    /// Segments, preview and output all refer to the old timeline, so they
    /// are discarded. If decoding fails the session is left as it was.
    ///
    /// # Returns
    /// Duration of the new audio in seconds
    pub fn load(&mut self, source: &AudioSource) -> Result<f64> {
        let audio = decode_audio(source, self.config.max_file_bytes)?;
        let duration = audio.duration_secs();

        self.player.reset();
        self.revoke_output();
        self.segments = Self::empty_segments(&self.config, duration);
        self.base_name = Some(source.base_name().to_string());
        self.audio = Some(audio);

        info!("Loaded '{}' ({:.3}s)", source.name, duration);
        Ok(duration)
    }

    pub fn audio(&self) -> Option<&AudioBuffer> {
        self.audio.as_ref()
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    // ========================================================================
    // Segment Editing
    // ========================================================================

    pub fn segments(&self) -> &SegmentList {
        &self.segments
    }

    /// Add a default-length segment starting at `t` seconds
    pub fn add_segment_at_time(&mut self, t: f64) -> Result<usize> {
        self.require_audio()?;
        self.segments.add_at_time(t)
    }

    pub fn update_segment_bound(
        &mut self,
        index: usize,
        bound: SegmentBound,
        value: f64,
    ) -> Result<()> {
        self.require_audio()?;
        self.segments.update_bound(index, bound, value)
    }

    /// Remove a segment; a preview of it stops
    pub fn remove_segment(&mut self, index: usize) -> Result<Segment> {
        if self.segments.selected() == Some(index) {
            self.player.reset();
        }
        self.segments.remove(index)
    }

    pub fn select_segment(&mut self, index: usize) -> Result<Segment> {
        self.segments.select(index).copied()
    }

    // ========================================================================
    // Preview Playback
    // ========================================================================

    /// Select segment `index` and preview exactly its range
    pub fn play_segment(&mut self, index: usize) -> Result<()> {
        let segment = self.select_segment(index)?;
        self.player.play_range(segment.start(), segment.end())
    }

    pub fn pause_playback(&mut self) {
        self.player.pause();
    }

    pub fn resume_playback(&mut self) -> Result<()> {
        self.player.resume()
    }

    pub fn stop_playback(&mut self) {
        self.player.stop();
    }

    /// Current preview state and cursor
    pub fn playback(&self) -> PlaybackTransport {
        self.player.snapshot()
    }

    // ========================================================================
    // Processing
    // ========================================================================

    /// Cut the segments out, encode them as WAV and publish the result
    ///
    /// The previous output handle is revoked once the new one exists.
    ///
    /// # Errors
    /// * `Busy` - A cut is already running
    /// * `NoAudioLoaded` - Nothing has been loaded
    /// * `NoSegments` - The segment list is empty
    pub fn process(&mut self) -> Result<ArtifactHandle> {
        let _guard = self.in_flight.try_begin("cut")?;
        let audio = self.require_audio()?;

        let output = cut_segments(audio, self.segments.segments())?;
        let bytes = encode_wav(&output)?;

        let base_name = self.base_name.as_deref().unwrap_or("audio");
        let artifact = OutputArtifact::new(
            bytes,
            OutputFormat::Wav.media_type(),
            cut_file_name(base_name),
        );
        info!(
            "Cut {} segments into {} ({} bytes)",
            self.segments.len(),
            artifact.file_name,
            artifact.len()
        );

        let handle = self.artifacts.create(artifact);
        self.revoke_output();
        self.output = Some(handle);
        Ok(handle)
    }

    pub fn output_handle(&self) -> Option<ArtifactHandle> {
        self.output
    }

    /// The most recent cut, if any
    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.and_then(|h| self.artifacts.get(h).ok())
    }

    pub fn artifacts(&self) -> &ArtifactRegistry {
        &self.artifacts
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_active()
    }

    /// Drop audio, segments, preview and output
    pub fn clear(&mut self) {
        self.player.reset();
        self.revoke_output();
        self.audio = None;
        self.base_name = None;
        self.segments = Self::empty_segments(&self.config, 0.0);
        info!("Cutter session cleared");
    }

    fn require_audio(&self) -> Result<&AudioBuffer> {
        self.audio.as_ref().ok_or(SpliceError::NoAudioLoaded)
    }

    fn revoke_output(&mut self) {
        if let Some(handle) = self.output.take() {
            self.artifacts.revoke(handle);
        }
    }
}

impl Default for CutterSession {
    fn default() -> Self {
        Self::new(SpliceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TransportState;
    use pretty_assertions::assert_eq;

    /// Mono WAV source with `secs` seconds of a ramp at 1 kHz
    fn wav_source(name: &str, secs: usize) -> AudioSource {
        let samples: Vec<f32> = (0..secs * 1000).map(|i| (i % 1000) as f32 / 1000.0).collect();
        let buffer = AudioBuffer::from_channels(vec![samples], 1000).unwrap();
        AudioSource::new(name, "audio/wav", encode_wav(&buffer).unwrap())
    }

    fn loaded(secs: usize) -> CutterSession {
        let mut session = CutterSession::default();
        session.load(&wav_source("talk.wav", secs)).unwrap();
        session
    }

    #[test]
    fn test_load_reports_duration() {
        let mut session = CutterSession::default();
        let duration = session.load(&wav_source("talk.wav", 90)).unwrap();
        assert_eq!(duration, 90.0);
        assert_eq!(session.base_name(), Some("talk"));
        assert_eq!(session.segments().audio_duration(), 90.0);
    }

    #[test]
    fn test_failed_load_keeps_prior_state() {
        let mut session = loaded(90);
        session.add_segment_at_time(5.0).unwrap();

        let bad = AudioSource::new("broken.wav", "audio/wav", b"RIFFjunk".to_vec());
        assert!(session.load(&bad).is_err());

        assert_eq!(session.base_name(), Some("talk"));
        assert_eq!(session.segments().len(), 1);
    }

    #[test]
    fn test_reload_discards_segments_and_output() {
        let mut session = loaded(90);
        session.add_segment_at_time(0.0).unwrap();
        session.process().unwrap();
        assert_eq!(session.artifacts().live_count(), 1);

        session.load(&wav_source("other.wav", 10)).unwrap();
        assert!(session.segments().is_empty());
        assert!(session.output().is_none());
        assert_eq!(session.artifacts().live_count(), 0);
    }

    #[test]
    fn test_edit_without_audio() {
        let mut session = CutterSession::default();
        assert!(matches!(
            session.add_segment_at_time(0.0),
            Err(SpliceError::NoAudioLoaded)
        ));
        assert!(matches!(session.process(), Err(SpliceError::NoAudioLoaded)));
    }

    #[test]
    fn test_process_without_segments() {
        let mut session = loaded(10);
        assert!(matches!(session.process(), Err(SpliceError::NoSegments)));
        assert!(!session.is_processing());
    }

    #[test]
    fn test_process_publishes_named_wav() {
        let mut session = loaded(90);
        session.add_segment_at_time(60.0).unwrap();
        session.add_segment_at_time(0.0).unwrap();
        session
            .update_segment_bound(1, SegmentBound::End, 2.0)
            .unwrap();

        let handle = session.process().unwrap();
        let artifact = session.artifacts().get(handle).unwrap();
        assert_eq!(artifact.file_name, "cut-talk.wav");
        assert_eq!(artifact.media_type, "audio/wav");
        // 2s + 30s at 1 kHz, mono 16-bit
        assert_eq!(artifact.len(), 44 + 32_000 * 2);
    }

    #[test]
    fn test_new_output_revokes_previous() {
        let mut session = loaded(90);
        session.add_segment_at_time(0.0).unwrap();
        let first = session.process().unwrap();
        let second = session.process().unwrap();

        assert_ne!(first, second);
        assert!(session.artifacts().get(first).is_err());
        assert_eq!(session.output_handle(), Some(second));
        assert_eq!(session.artifacts().live_count(), 1);
    }

    #[test]
    fn test_process_while_busy() {
        let mut session = loaded(90);
        session.add_segment_at_time(0.0).unwrap();

        let held = session.in_flight.try_begin("cut").unwrap();
        assert!(matches!(
            session.process(),
            Err(SpliceError::Busy { operation: "cut" })
        ));
        assert!(session.output().is_none());

        drop(held);
        assert!(session.process().is_ok());
    }

    #[test]
    fn test_play_segment_selects_and_plays() {
        let mut session = loaded(90);
        session.add_segment_at_time(10.0).unwrap();
        session.play_segment(0).unwrap();

        assert_eq!(session.segments().selected(), Some(0));
        let playback = session.playback();
        assert_eq!(playback.range(), Some((10.0, 40.0)));
        assert_ne!(playback.state(), TransportState::Stopped);

        session.stop_playback();
        let playback = session.playback();
        assert_eq!(playback.state(), TransportState::Stopped);
        assert_eq!(playback.cursor(), 10.0);
    }

    #[test]
    fn test_removing_previewed_segment_stops_preview() {
        let mut session = loaded(90);
        session.add_segment_at_time(10.0).unwrap();
        session.play_segment(0).unwrap();

        session.remove_segment(0).unwrap();
        assert_eq!(session.playback().state(), TransportState::Stopped);
        assert_eq!(session.segments().selected(), None);
    }

    #[test]
    fn test_clear() {
        let mut session = loaded(90);
        session.add_segment_at_time(0.0).unwrap();
        session.process().unwrap();

        session.clear();
        assert!(session.audio().is_none());
        assert!(session.segments().is_empty());
        assert!(session.output().is_none());
        assert_eq!(session.artifacts().live_count(), 0);
    }
}
