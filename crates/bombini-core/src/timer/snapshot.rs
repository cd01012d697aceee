//! Persisted form of the timer session.
//!
//! The snapshot is flat and self-describing: together with the current
//! wall-clock time it is enough to rebuild the engine after a restart.

use serde::{Deserialize, Serialize};

use super::config::{FocusConfig, PomodoroConfig, PomodoroMode};
use super::engine::{TimerKind, TimerStatus};
use crate::error::SnapshotError;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub active_timer: Option<TimerKind>,
    pub status: TimerStatus,
    pub end_at_ms: Option<u64>,
    pub paused_remaining_ms: Option<u64>,
    pub pomodoro: PomodoroConfig,
    pub pomodoro_mode: PomodoroMode,
    pub completed_work_ms: u64,
    pub total_work_ms: u64,
    pub session_start_ms: Option<u64>,
    pub focus: FocusConfig,
    pub time_elapsed_ms: u64,
    pub distraction_count: u32,
}

/// What `restore` made of the persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RestoreOutcome {
    /// Nothing was persisted.
    Empty,
    /// The snapshot was unreadable or inconsistent and was discarded.
    Discarded,
    /// Only configuration was carried over.
    Idle,
    Running { remaining_ms: u64 },
    Paused { remaining_ms: u64 },
    /// The countdown ran out while the process was down.
    Expired { overdue_ms: u64 },
}

impl SessionSnapshot {
    /// Parse and validate a persisted snapshot.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed, a required field is
    /// missing, or the fields contradict each other.
    pub fn parse(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: SessionSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(self.version));
        }
        if self.pomodoro.work_duration_ms == 0
            || self.pomodoro.break_duration_ms == 0
            || self.focus.duration_ms == 0
        {
            return Err(SnapshotError::Malformed("zero duration".into()));
        }

        match self.status {
            TimerStatus::Running => {
                if self.active_timer.is_none() || self.end_at_ms.is_none() {
                    return Err(SnapshotError::Malformed(
                        "running snapshot without active timer or end_at_ms".into(),
                    ));
                }
                if self.paused_remaining_ms.is_some() {
                    return Err(SnapshotError::Malformed(
                        "running snapshot with paused_remaining_ms".into(),
                    ));
                }
            }
            TimerStatus::Paused => {
                if self.active_timer.is_none() || self.paused_remaining_ms.is_none() {
                    return Err(SnapshotError::Malformed(
                        "paused snapshot without active timer or paused_remaining_ms".into(),
                    ));
                }
                if self.end_at_ms.is_some() {
                    return Err(SnapshotError::Malformed(
                        "paused snapshot with end_at_ms".into(),
                    ));
                }
            }
            TimerStatus::Idle | TimerStatus::Finished => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerEngine;

    #[test]
    fn engine_snapshot_parses_back() {
        let mut engine = TimerEngine::default();
        engine.start_pomodoro(1_000);
        let json = engine.to_snapshot().to_json().unwrap();
        let parsed = SessionSnapshot::parse(&json).unwrap();
        assert_eq!(parsed, engine.to_snapshot());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut json = serde_json::to_value(TimerEngine::default().to_snapshot()).unwrap();
        json.as_object_mut().unwrap().remove("pomodoro");
        assert!(SessionSnapshot::parse(&json.to_string()).is_err());
    }

    #[test]
    fn running_without_end_at_is_rejected() {
        let mut engine = TimerEngine::default();
        engine.start_focus(1_000);
        let mut snapshot = engine.to_snapshot();
        snapshot.end_at_ms = None;
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Malformed(_))));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut snapshot = TimerEngine::default().to_snapshot();
        snapshot.version = 99;
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Version(99))));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            SessionSnapshot::parse("{not json"),
            Err(SnapshotError::Json(_))
        ));
    }
}
