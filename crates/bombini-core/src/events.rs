use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{FocusConfig, FocusKind, PomodoroConfig, PomodoroMode, TimerKind, TimerStatus};

/// Every state change of the timer produces an Event.
/// A `None` from an engine operation means nothing changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        timer: TimerKind,
        /// Pomodoro phase, absent for Focus sessions.
        mode: Option<PomodoroMode>,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        timer: Option<TimerKind>,
        previous: TimerStatus,
        at: DateTime<Utc>,
    },
    TimerReset {
        timer: Option<TimerKind>,
        at: DateTime<Utc>,
    },
    /// A Pomodoro phase ran out.
    PhaseCompleted {
        completed: PomodoroMode,
        next: PomodoroMode,
        auto_advanced: bool,
        total_work_ms: u64,
        at: DateTime<Utc>,
    },
    /// A Focus session ran out. Terminal for that session.
    FocusFinished {
        kind: FocusKind,
        elapsed_ms: u64,
        distractions: u32,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: PomodoroMode,
        at: DateTime<Utc>,
    },
    DistractionRegistered {
        count: u32,
        at: DateTime<Utc>,
    },
    ConfigUpdated {
        pomodoro: PomodoroConfig,
        focus: FocusConfig,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for the events that end a countdown by running out.
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::PhaseCompleted { .. } | Event::FocusFinished { .. })
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::TimerReset { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::FocusFinished { at, .. }
            | Event::ModeSwitched { at, .. }
            | Event::DistractionRegistered { at, .. }
            | Event::ConfigUpdated { at, .. } => *at,
        }
    }
}

/// Convert epoch milliseconds into an event timestamp.
pub fn timestamp(now_ms: u64) -> DateTime<Utc> {
    i64::try_from(now_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::TimerPaused {
            remaining_ms: 1_000,
            at: timestamp(0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "timer_paused");
        assert_eq!(json["remaining_ms"], 1_000);
    }

    #[test]
    fn completion_events_are_flagged() {
        let done = Event::FocusFinished {
            kind: FocusKind::Deep,
            elapsed_ms: 0,
            distractions: 0,
            at: timestamp(0),
        };
        assert!(done.is_completion());
        assert!(!Event::TimerReset { timer: None, at: timestamp(0) }.is_completion());
    }

    #[test]
    fn timestamp_converts_epoch_millis() {
        assert_eq!(timestamp(1_500).timestamp_millis(), 1_500);
    }
}
