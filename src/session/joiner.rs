//! Joiner session
//!
//! An ordered list of files to be appended end to end, with per-file
//! previews and a single joined output.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use uuid::Uuid;

use crate::config::SpliceConfig;
use crate::engine::{
    decode_audio, encode_mp3, encode_wav, join_sources, joined_file_name, ArtifactHandle,
    ArtifactRegistry, AudioSource, Mp3Capability, OutputArtifact, OutputFormat,
    PlaybackTransport, PreviewPlayer,
};
use crate::error::{Result, SpliceError};
use crate::session::InFlight;

/// One file queued for joining
#[derive(Debug, Clone)]
pub struct JoinEntry {
    id: Uuid,
    source: AudioSource,
    duration_secs: f64,
    sample_rate: u32,
    channels: usize,
}

impl JoinEntry {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// File size in bytes
    pub fn size(&self) -> u64 {
        self.source.size()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

/// State for joining several files into one
pub struct JoinerSession {
    config: SpliceConfig,
    entries: Vec<JoinEntry>,
    fade: bool,
    format: OutputFormat,
    mp3: Option<Arc<dyn Mp3Capability>>,
    artifacts: ArtifactRegistry,
    output: Option<ArtifactHandle>,
    /// Preview handle per entry
    previews: HashMap<Uuid, ArtifactHandle>,
    previewing: Option<Uuid>,
    player: PreviewPlayer,
    in_flight: InFlight,
}

impl fmt::Debug for JoinerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinerSession")
            .field("entries", &self.entries.len())
            .field("fade", &self.fade)
            .field("format", &self.format)
            .field("mp3", &self.mp3.is_some())
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl JoinerSession {
    pub fn new(config: SpliceConfig) -> Self {
        let player = PreviewPlayer::new(Duration::from_millis(config.poll_interval_ms));
        Self {
            config,
            entries: Vec::new(),
            fade: false,
            format: OutputFormat::Wav,
            mp3: None,
            artifacts: ArtifactRegistry::new(),
            output: None,
            previews: HashMap::new(),
            previewing: None,
            player,
            in_flight: InFlight::new(),
        }
    }

    /// Install the encoder used for MP3 output
    pub fn with_mp3_capability(mut self, capability: Arc<dyn Mp3Capability>) -> Self {
        self.mp3 = Some(capability);
        self
    }

    pub fn set_mp3_capability(&mut self, capability: Option<Arc<dyn Mp3Capability>>) {
        self.mp3 = capability;
    }

    // ========================================================================
    // Options
    // ========================================================================

    pub fn fade(&self) -> bool {
        self.fade
    }

    pub fn set_fade(&mut self, fade: bool) {
        self.fade = fade;
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    // ========================================================================
    // File List
    // ========================================================================

    /// Validate and decode `source`, then append it to the list
    ///
    /// Sample rate and channel count are recorded but not compared with
    /// other entries until [`process`](Self::process).
    pub fn add_file(&mut self, source: AudioSource) -> Result<Uuid> {
        let decoded = decode_audio(&source, self.config.max_file_bytes)?;
        let entry = JoinEntry {
            id: Uuid::new_v4(),
            duration_secs: decoded.duration_secs(),
            sample_rate: decoded.sample_rate(),
            channels: decoded.channels(),
            source,
        };
        let id = entry.id;
        info!(
            "Queued '{}' ({:.3}s) as entry {}",
            entry.name(),
            entry.duration_secs,
            self.entries.len() + 1
        );
        self.entries.push(entry);
        Ok(id)
    }

    /// Entries in join order
    pub fn entries(&self) -> &[JoinEntry] {
        &self.entries
    }

    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(JoinEntry::duration_secs).sum()
    }

    /// Swap an entry with the one before it; no-op at the top
    pub fn move_up(&mut self, id: Uuid) -> Result<()> {
        let pos = self.position(id)?;
        if pos > 0 {
            self.entries.swap(pos, pos - 1);
            debug!("Moved {} up to position {}", id, pos - 1);
        }
        Ok(())
    }

    /// Swap an entry with the one after it; no-op at the bottom
    pub fn move_down(&mut self, id: Uuid) -> Result<()> {
        let pos = self.position(id)?;
        if pos + 1 < self.entries.len() {
            self.entries.swap(pos, pos + 1);
            debug!("Moved {} down to position {}", id, pos + 1);
        }
        Ok(())
    }

    /// Drop an entry along with its preview
    pub fn remove(&mut self, id: Uuid) -> Result<JoinEntry> {
        let pos = self.position(id)?;
        if self.previewing == Some(id) {
            self.player.reset();
            self.previewing = None;
        }
        if let Some(handle) = self.previews.remove(&id) {
            self.artifacts.revoke(handle);
        }
        let entry = self.entries.remove(pos);
        debug!("Removed '{}'", entry.name());
        Ok(entry)
    }

    /// Publish the entry's original bytes and start playing it
    ///
    /// Previewing the same entry again replaces its handle.
    pub fn preview(&mut self, id: Uuid) -> Result<ArtifactHandle> {
        let pos = self.position(id)?;
        let entry = &self.entries[pos];
        let artifact = OutputArtifact::new(
            entry.source.bytes.clone(),
            entry.source.media_type.clone(),
            entry.source.name.clone(),
        );
        let duration = entry.duration_secs;

        let handle = self.artifacts.create(artifact);
        if let Some(old) = self.previews.insert(id, handle) {
            self.artifacts.revoke(old);
        }

        self.player.play_range(0.0, duration)?;
        self.previewing = Some(id);
        Ok(handle)
    }

    /// Stop the preview; its handle stays live until superseded or removed
    pub fn stop_preview(&mut self) {
        self.player.stop();
        self.previewing = None;
    }

    /// Current preview state and cursor
    pub fn playback(&self) -> PlaybackTransport {
        self.player.snapshot()
    }

    // ========================================================================
    // Processing
    // ========================================================================

    /// Decode every entry, join them in order and encode the result
    ///
    /// # Errors
    /// * `Busy` - A join is already running
    /// * `NotEnoughFiles` - Fewer than two entries
    /// * `Decode` / `FormatMismatch` - Names the offending file
    /// * `EncoderUnavailable` - MP3 requested without an encoder
    pub fn process(&mut self) -> Result<ArtifactHandle> {
        let _guard = self.in_flight.try_begin("join")?;

        let sources: Vec<&AudioSource> = self.entries.iter().map(JoinEntry::source).collect();
        let fade = self.fade.then_some(self.config.fade_secs);
        let joined = join_sources(&sources, self.config.max_file_bytes, fade)?;

        let bytes = match self.format {
            OutputFormat::Wav => encode_wav(&joined)?,
            OutputFormat::Mp3 => encode_mp3(
                &joined,
                self.mp3.as_deref(),
                self.config.mp3_bitrate_kbps,
                self.config.mp3_block_size,
            )?,
        };
        let artifact = OutputArtifact::new(
            bytes,
            self.format.media_type(),
            joined_file_name(self.format),
        );
        info!(
            "Joined {} files into {} ({} bytes)",
            self.entries.len(),
            artifact.file_name,
            artifact.len()
        );

        let handle = self.artifacts.create(artifact);
        if let Some(old) = self.output.replace(handle) {
            self.artifacts.revoke(old);
        }
        Ok(handle)
    }

    pub fn output_handle(&self) -> Option<ArtifactHandle> {
        self.output
    }

    /// The most recent join, if any
    pub fn output(&self) -> Option<&OutputArtifact> {
        self.output.and_then(|h| self.artifacts.get(h).ok())
    }

    pub fn artifacts(&self) -> &ArtifactRegistry {
        &self.artifacts
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_active()
    }

    /// Drop every entry, preview and output
    pub fn clear(&mut self) {
        self.player.reset();
        self.previewing = None;
        for (_, handle) in self.previews.drain() {
            self.artifacts.revoke(handle);
        }
        if let Some(handle) = self.output.take() {
            self.artifacts.revoke(handle);
        }
        self.entries.clear();
        info!("Joiner session cleared");
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| SpliceError::UnknownEntry { id: id.to_string() })
    }
}

impl Default for JoinerSession {
    fn default() -> Self {
        Self::new(SpliceConfig::default())
    }
}
