//! Preview playback transport
//!
//! [`PlaybackTransport`] is the state machine behind segment and joined-file
//! previews: it plays a bounded range, tracks a cursor, and when the cursor
//! reaches the end of the range it stops and rewinds to the range start.
//! [`PreviewPlayer`] drives a transport from a [`Ticker`] so the cursor
//! advances in wall-clock time.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::debug;

use crate::engine::ticker::Ticker;
use crate::error::{Result, SpliceError};

/// Playback states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// Nothing playing; cursor sits at the range start
    #[default]
    Stopped,
    /// Cursor advancing
    Playing,
    /// Cursor held where it was
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Stopped => write!(f, "Stopped"),
            TransportState::Playing => write!(f, "Playing"),
            TransportState::Paused => write!(f, "Paused"),
        }
    }
}

/// Range-bounded playback state and cursor
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackTransport {
    state: TransportState,

    /// Cursor position in seconds
    cursor: f64,

    /// Range being previewed, `[start, end)` in seconds
    range: Option<(f64, f64)>,
}

impl Default for PlaybackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackTransport {
    /// Create a stopped transport with the cursor at zero
    ///
    /// # Example
    /// ```
    /// use audiosplice::engine::PlaybackTransport;
    /// let transport = PlaybackTransport::new();
    /// assert!(transport.is_stopped());
    /// ```
    pub fn new() -> Self {
        Self {
            state: TransportState::Stopped,
            cursor: 0.0,
            range: None,
        }
    }

    // ========================================================================
    // Transport Controls
    // ========================================================================

    /// Start playing `[start, end)` from its beginning
    ///
    /// Replaces whatever range was playing before.
    ///
    /// # Errors
    /// * `InvalidSegment` - Bounds are not finite or `start >= end`
    ///
    /// # Example
    /// ```
    /// use audiosplice::engine::PlaybackTransport;
    /// let mut transport = PlaybackTransport::new();
    /// transport.play_range(2.0, 4.0).unwrap();
    /// assert!(transport.is_playing());
    /// assert_eq!(transport.cursor(), 2.0);
    /// ```
    pub fn play_range(&mut self, start: f64, end: f64) -> Result<()> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start >= end {
            return Err(SpliceError::InvalidSegment {
                reason: format!("cannot play range {:.3}s..{:.3}s", start, end),
            });
        }
        self.range = Some((start, end));
        self.cursor = start;
        self.state = TransportState::Playing;
        debug!("[TRANSPORT] Play {:.3}s..{:.3}s", start, end);
        Ok(())
    }

    /// Resume from a pause
    ///
    /// Returns false if there was nothing paused to resume.
    pub fn resume(&mut self) -> bool {
        match self.state {
            TransportState::Paused => {
                self.state = TransportState::Playing;
                debug!("[TRANSPORT] Resume at {:.3}s", self.cursor);
                true
            }
            TransportState::Playing => {
                debug!("[TRANSPORT] Already playing");
                false
            }
            TransportState::Stopped => false,
        }
    }

    /// Pause playback, keeping the cursor
    ///
    /// State transitions:
    /// - Playing -> Paused
    /// - Paused/Stopped -> unchanged
    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
            debug!("[TRANSPORT] Paused at {:.3}s", self.cursor);
        }
    }

    /// Stop and rewind the cursor to the range start
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.cursor = self.range_start();
        debug!("[TRANSPORT] Stopped, cursor reset to {:.3}s", self.cursor);
    }

    /// Forget the range entirely; cursor goes back to zero
    pub fn reset(&mut self) {
        self.state = TransportState::Stopped;
        self.range = None;
        self.cursor = 0.0;
    }

    /// Move the cursor, clamped to the current range
    pub fn seek(&mut self, position: f64) {
        self.cursor = match self.range {
            Some((start, end)) => position.clamp(start, end),
            None => position.max(0.0),
        };
        debug!("[TRANSPORT] Seek to {:.3}s", self.cursor);
    }

    /// Advance the cursor by `secs` of playback
    ///
    /// Does nothing unless playing. When the cursor reaches the end of the
    /// range, playback stops and the cursor rewinds to the range start.
    ///
    /// # Returns
    /// True if this call finished the range
    pub fn advance(&mut self, secs: f64) -> bool {
        if self.state != TransportState::Playing {
            return false;
        }
        let Some((_, end)) = self.range else {
            return false;
        };

        self.cursor += secs.max(0.0);
        if self.cursor >= end {
            debug!("[TRANSPORT] Reached end of range at {:.3}s", end);
            self.stop();
            return true;
        }
        false
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        self.range
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == TransportState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == TransportState::Stopped
    }

    fn range_start(&self) -> f64 {
        self.range.map(|(start, _)| start).unwrap_or(0.0)
    }
}

// ============================================================================
// Ticker-driven player
// ============================================================================

fn lock(transport: &Mutex<PlaybackTransport>) -> MutexGuard<'_, PlaybackTransport> {
    transport.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A transport whose cursor advances on its own
///
/// At most one ticker runs per player; starting a new range cancels the
/// previous one first.
#[derive(Debug)]
pub struct PreviewPlayer {
    transport: Arc<Mutex<PlaybackTransport>>,
    ticker: Option<Ticker>,
    interval: Duration,
}

impl PreviewPlayer {
    /// # Arguments
    /// * `interval` - How often the cursor is advanced
    pub fn new(interval: Duration) -> Self {
        Self {
            transport: Arc::new(Mutex::new(PlaybackTransport::new())),
            ticker: None,
            interval,
        }
    }

    /// Play `[start, end)`, cancelling any preview in progress
    pub fn play_range(&mut self, start: f64, end: f64) -> Result<()> {
        self.halt_ticker();
        lock(&self.transport).play_range(start, end)?;
        self.spawn_ticker()
    }

    pub fn pause(&mut self) {
        self.halt_ticker();
        lock(&self.transport).pause();
    }

    /// Resume a paused preview; no-op otherwise
    pub fn resume(&mut self) -> Result<()> {
        let resumed = lock(&self.transport).resume();
        if resumed {
            self.halt_ticker();
            self.spawn_ticker()?;
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.halt_ticker();
        lock(&self.transport).stop();
    }

    /// Stop and forget the current range
    pub fn reset(&mut self) {
        self.halt_ticker();
        lock(&self.transport).reset();
    }

    /// Copy of the transport as of now
    pub fn snapshot(&self) -> PlaybackTransport {
        lock(&self.transport).clone()
    }

    pub fn state(&self) -> TransportState {
        lock(&self.transport).state()
    }

    pub fn cursor(&self) -> f64 {
        lock(&self.transport).cursor()
    }

    fn spawn_ticker(&mut self) -> Result<()> {
        let transport = Arc::clone(&self.transport);
        let mut last = Instant::now();

        let ticker = Ticker::start(self.interval, move || {
            let now = Instant::now();
            let elapsed = now.duration_since(last).as_secs_f64();
            last = now;

            let mut transport = lock(&transport);
            if !transport.is_playing() || transport.advance(elapsed) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        self.ticker = Some(ticker);
        Ok(())
    }

    // Must not be called while holding the transport lock
    fn halt_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    // ------------------------------------------------------------------------
    // State Machine Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_default_state_is_stopped() {
        let transport = PlaybackTransport::new();
        assert!(transport.is_stopped());
        assert_eq!(transport.cursor(), 0.0);
        assert_eq!(transport.range(), None);
    }

    #[test]
    fn test_play_range_sets_cursor() {
        let mut transport = PlaybackTransport::new();
        transport.play_range(3.0, 5.0).unwrap();
        assert!(transport.is_playing());
        assert_eq!(transport.cursor(), 3.0);
        assert_eq!(transport.range(), Some((3.0, 5.0)));
    }

    #[test]
    fn test_play_range_rejects_bad_bounds() {
        let mut transport = PlaybackTransport::new();
        assert!(transport.play_range(5.0, 5.0).is_err());
        assert!(transport.play_range(-1.0, 5.0).is_err());
        assert!(transport.play_range(0.0, f64::NAN).is_err());
        assert!(transport.is_stopped());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut transport = PlaybackTransport::new();
        transport.play_range(0.0, 10.0).unwrap();
        transport.advance(2.5);

        transport.pause();
        assert!(transport.is_paused());
        transport.advance(1.0);
        assert_eq!(transport.cursor(), 2.5);

        assert!(transport.resume());
        assert!(transport.is_playing());
        assert!(!transport.resume());
    }

    #[test]
    fn test_stop_rewinds_to_range_start() {
        let mut transport = PlaybackTransport::new();
        transport.play_range(4.0, 8.0).unwrap();
        transport.advance(1.0);
        transport.stop();
        assert!(transport.is_stopped());
        assert_eq!(transport.cursor(), 4.0);
    }

    #[test]
    fn test_reaching_end_stops_and_rewinds() {
        let mut transport = PlaybackTransport::new();
        transport.play_range(1.0, 2.0).unwrap();

        assert!(!transport.advance(0.6));
        assert!(transport.advance(0.6));
        assert!(transport.is_stopped());
        assert_eq!(transport.cursor(), 1.0);
    }

    #[test]
    fn test_seek_clamped_to_range() {
        let mut transport = PlaybackTransport::new();
        transport.seek(-3.0);
        assert_eq!(transport.cursor(), 0.0);

        transport.play_range(2.0, 4.0).unwrap();
        transport.seek(10.0);
        assert_eq!(transport.cursor(), 4.0);
        transport.seek(0.0);
        assert_eq!(transport.cursor(), 2.0);
    }

    #[test]
    fn test_reset_forgets_range() {
        let mut transport = PlaybackTransport::new();
        transport.play_range(2.0, 4.0).unwrap();
        transport.reset();
        assert_eq!(transport, PlaybackTransport::new());
    }

    #[test]
    fn test_transport_state_display() {
        assert_eq!(format!("{}", TransportState::Stopped), "Stopped");
        assert_eq!(format!("{}", TransportState::Playing), "Playing");
        assert_eq!(format!("{}", TransportState::Paused), "Paused");
    }

    // ------------------------------------------------------------------------
    // Player Tests
    // ------------------------------------------------------------------------

    fn wait_for_stop(player: &PreviewPlayer) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(3) {
            if player.state() == TransportState::Stopped {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_player_runs_to_end() {
        let mut player = PreviewPlayer::new(Duration::from_millis(2));
        player.play_range(0.5, 0.55).unwrap();

        assert!(wait_for_stop(&player));
        assert_eq!(player.cursor(), 0.5);
    }

    #[test]
    fn test_player_pause_holds_cursor() {
        let mut player = PreviewPlayer::new(Duration::from_millis(2));
        player.play_range(0.0, 60.0).unwrap();
        thread::sleep(Duration::from_millis(20));

        player.pause();
        let held = player.cursor();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(player.cursor(), held);
        assert_eq!(player.state(), TransportState::Paused);

        player.stop();
        assert_eq!(player.cursor(), 0.0);
    }

    #[test]
    fn test_player_new_range_replaces_old() {
        let mut player = PreviewPlayer::new(Duration::from_millis(2));
        player.play_range(0.0, 60.0).unwrap();
        player.play_range(10.0, 20.0).unwrap();

        let snapshot = player.snapshot();
        assert_eq!(snapshot.range(), Some((10.0, 20.0)));
        assert!(snapshot.cursor() >= 10.0);
    }
}
