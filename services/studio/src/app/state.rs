//! services/studio/src/app/state.rs
//!
//! Shared mutable state for the interaction controller: the fields behind the
//! controller's lock, and the single in-flight request latch.

use design_consultant_core::domain::{RoomImage, Session};
use std::sync::atomic::{AtomicBool, Ordering};

/// Everything the controller mutates, held behind one async mutex. The lock
/// is never kept across a Gateway await, so concurrent callers observe `busy`
/// through the latch instead of queueing behind the lock.
#[derive(Default)]
pub(crate) struct ControllerState {
    /// At most one live session; replaced wholesale by a new upload.
    pub session: Option<Session>,
    /// Context-specific loading copy while a request is in flight.
    pub status: Option<String>,
    /// Persistent banner text from the most recent failure.
    pub last_error: Option<String>,
    /// The latest standalone concept render.
    pub inspiration: Option<RoomImage>,
}

/// The idle/busy latch guarding the request-issuing operations. Acquisition
/// while busy fails immediately: overlapping requests are dropped, never
/// queued.
#[derive(Debug, Default)]
pub(crate) struct RequestLatch {
    busy: AtomicBool,
}

impl RequestLatch {
    pub fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Attempts the idle -> busy transition. Returns `false` when a request
    /// is already in flight.
    pub fn try_begin(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns to idle. Runs on every completion path, success or failure.
    pub fn finish(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}
