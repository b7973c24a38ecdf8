//! Session Module
//!
//! Stateful front ends over the engine: a cutter session for one file and
//! its segments, and a joiner session for an ordered list of files. Each
//! session owns its decoded audio, output artifacts and preview player.

pub mod cutter;
pub mod joiner;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

use crate::error::{Result, SpliceError};

pub use cutter::CutterSession;
pub use joiner::{JoinEntry, JoinerSession};

/// Marks a long-running operation as in progress
///
/// Cloning shares the flag, so any clone can observe or hold it.
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    active: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag for `operation`
    ///
    /// # Errors
    /// * `Busy` - Another operation holds the flag
    pub fn try_begin(&self, operation: &'static str) -> Result<InFlightGuard> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected {}: already processing", operation);
            return Err(SpliceError::Busy { operation });
        }
        Ok(InFlightGuard {
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Releases the in-flight flag when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
