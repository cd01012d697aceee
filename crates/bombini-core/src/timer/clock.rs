//! Wall-clock sources for the timer.
//!
//! The engine itself takes `now` as an argument on every call; a [`Clock`]
//! is what the service uses to supply it.

use std::cell::Cell;
use std::rc::Rc;

/// Source of the current wall-clock time in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let ms = chrono::Utc::now().timestamp_millis();
        u64::try_from(ms).unwrap_or(0)
    }
}

/// A manually advanced clock.
///
/// Clones share the same instant, so a test can keep a handle while the
/// service owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }

    /// Move the clock backwards, as after a manual clock change.
    pub fn rewind(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_sub(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
