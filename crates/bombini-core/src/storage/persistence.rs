//! Persistence adapter for the timer snapshot.
//!
//! The engine never sees storage errors. Everything that can go wrong here
//! (a locked database, a disk error, a corrupt or partial snapshot) is logged
//! and swallowed, and a bad snapshot is treated as if nothing was persisted.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::database::Database;
use crate::error::{CoreError, DatabaseError, Result};
use crate::timer::{FocusConfig, PomodoroConfig, RestoreOutcome, SessionSnapshot, TimerEngine};

/// Key of the snapshot slot in the kv table.
pub const SNAPSHOT_KEY: &str = "timer_session";

/// A durable single-slot store for the serialized snapshot.
pub trait SnapshotStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, json: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

impl SnapshotStore for Database {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.kv_get(SNAPSHOT_KEY)?)
    }

    fn save(&self, json: &str) -> Result<()> {
        Ok(self.kv_set(SNAPSHOT_KEY, json)?)
    }

    fn clear(&self) -> Result<()> {
        Ok(self.kv_delete(SNAPSHOT_KEY)?)
    }
}

/// In-process store, for tests and for running without a database.
///
/// `fail_writes` makes every `save`/`clear` fail, to exercise the
/// error-swallowing paths.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: RefCell<Option<String>>,
    fail_writes: Cell<bool>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(json: impl Into<String>) -> Self {
        Self {
            slot: RefCell::new(Some(json.into())),
            fail_writes: Cell::new(false),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.get() {
            return Err(CoreError::Database(DatabaseError::Locked));
        }
        Ok(())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, json: &str) -> Result<()> {
        self.check_writable()?;
        *self.slot.borrow_mut() = Some(json.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.check_writable()?;
        self.slot.borrow_mut().take();
        Ok(())
    }
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Rc<T> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, json: &str) -> Result<()> {
        (**self).save(json)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Writes, restores and clears the snapshot slot.
pub struct Persistence {
    store: Box<dyn SnapshotStore>,
}

impl Persistence {
    pub fn new(store: impl SnapshotStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Write a full snapshot of `engine`. Failures are logged and dropped.
    pub fn persist(&self, engine: &TimerEngine) {
        let result = engine
            .to_snapshot()
            .to_json()
            .map_err(CoreError::from)
            .and_then(|json| self.store.save(&json));
        match result {
            Ok(()) => debug!(status = ?engine.status(), "snapshot persisted"),
            Err(e) => warn!("failed to persist timer snapshot: {e}"),
        }
    }

    /// Erase the snapshot. Failures are logged and dropped.
    pub fn clear(&self) {
        match self.store.clear() {
            Ok(()) => debug!("snapshot cleared"),
            Err(e) => warn!("failed to clear timer snapshot: {e}"),
        }
    }

    /// Rebuild the engine from the slot at wall-clock `now_ms`.
    ///
    /// `pomodoro` and `focus` seed the engine when nothing usable was
    /// persisted. An expired countdown is adopted as `Finished` and the slot
    /// is cleared; a corrupt snapshot is cleared and ignored.
    pub fn restore(
        &self,
        pomodoro: PomodoroConfig,
        focus: FocusConfig,
        now_ms: u64,
    ) -> (TimerEngine, RestoreOutcome) {
        let fresh = || TimerEngine::new(pomodoro, focus);

        let raw = match self.store.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no timer snapshot to restore");
                return (fresh(), RestoreOutcome::Empty);
            }
            Err(e) => {
                warn!("failed to read timer snapshot: {e}");
                return (fresh(), RestoreOutcome::Empty);
            }
        };

        let snapshot = match SessionSnapshot::parse(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("discarding timer snapshot: {e}");
                self.clear();
                return (fresh(), RestoreOutcome::Discarded);
            }
        };

        let (engine, outcome) = TimerEngine::from_snapshot(&snapshot, now_ms);
        info!(?outcome, "timer session restored");
        if matches!(outcome, RestoreOutcome::Expired { .. }) {
            self.clear();
        }
        (engine, outcome)
    }
}
