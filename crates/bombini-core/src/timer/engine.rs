//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine shared by the two
//! timer kinds (Pomodoro work/break cycles and single-shot Focus sessions).
//! It does not use internal threads and never reads the clock itself: every
//! operation takes `now` in epoch milliseconds, and the caller is responsible
//! for calling `evaluate()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running
//! Running -(countdown hits 0)-> Finished | Running (auto-advance) | Paused (phase boundary)
//! Paused | Finished -reset-> Idle
//! any -stop-> Finished
//! ```
//!
//! Remaining time is always `end_at - now`, recomputed on every evaluation.
//! Nothing is ever decremented per tick, so skipped or throttled ticks
//! cannot introduce drift.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::default();
//! engine.start_pomodoro(now);
//! // In a loop:
//! engine.evaluate(now); // Returns Some(Event) when a countdown runs out
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{
    clamp_minutes, minutes_to_ms, FocusConfig, FocusKind, PomodoroConfig, PomodoroMode,
    BREAK_MINUTES_RANGE, FOCUS_MINUTES_RANGE, WORK_MINUTES_RANGE,
};
use super::snapshot::{RestoreOutcome, SessionSnapshot, SNAPSHOT_VERSION};
use crate::events::{timestamp, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

/// Which timer owns the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Pomodoro,
    Focus,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::Pomodoro => "pomodoro",
            TimerKind::Focus => "focus",
        }
    }
}

/// Core timer engine.
///
/// Invariants:
/// - `end_at_ms` is set iff the status is `Running`.
/// - `paused_remaining_ms` is set iff the status is `Paused`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEngine {
    active_timer: Option<TimerKind>,
    status: TimerStatus,
    end_at_ms: Option<u64>,
    paused_remaining_ms: Option<u64>,
    /// Cached projection of the remaining time, for display only.
    time_remaining_ms: u64,
    pomodoro: PomodoroConfig,
    pomodoro_mode: PomodoroMode,
    /// Sum of fully completed Work phases.
    completed_work_ms: u64,
    /// Completed Work phases plus the in-progress one.
    total_work_ms: u64,
    focus: FocusConfig,
    time_elapsed_ms: u64,
    distraction_count: u32,
    session_start_ms: Option<u64>,
}

impl TimerEngine {
    /// Create an idle engine with no active timer.
    pub fn new(pomodoro: PomodoroConfig, focus: FocusConfig) -> Self {
        Self {
            active_timer: None,
            status: TimerStatus::Idle,
            end_at_ms: None,
            paused_remaining_ms: None,
            time_remaining_ms: 0,
            pomodoro,
            pomodoro_mode: PomodoroMode::Work,
            completed_work_ms: 0,
            total_work_ms: 0,
            focus,
            time_elapsed_ms: 0,
            distraction_count: 0,
            session_start_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn active_timer(&self) -> Option<TimerKind> {
        self.active_timer
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn end_at_ms(&self) -> Option<u64> {
        self.end_at_ms
    }

    pub fn paused_remaining_ms(&self) -> Option<u64> {
        self.paused_remaining_ms
    }

    pub fn time_remaining_ms(&self) -> u64 {
        self.time_remaining_ms
    }

    pub fn pomodoro_config(&self) -> PomodoroConfig {
        self.pomodoro
    }

    pub fn pomodoro_mode(&self) -> PomodoroMode {
        self.pomodoro_mode
    }

    pub fn total_work_ms(&self) -> u64 {
        self.total_work_ms
    }

    pub fn focus_config(&self) -> FocusConfig {
        self.focus
    }

    pub fn time_elapsed_ms(&self) -> u64 {
        self.time_elapsed_ms
    }

    pub fn distraction_count(&self) -> u32 {
        self.distraction_count
    }

    pub fn session_start_ms(&self) -> Option<u64> {
        self.session_start_ms
    }

    /// Full length of the countdown currently shown.
    pub fn current_duration_ms(&self) -> u64 {
        match self.active_timer {
            Some(TimerKind::Pomodoro) => self.pomodoro.duration_ms(self.pomodoro_mode),
            Some(TimerKind::Focus) => self.focus.duration_ms,
            None => 0,
        }
    }

    /// True while a countdown exists that a config change would invalidate.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.status, TimerStatus::Running | TimerStatus::Paused)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the current Pomodoro phase.
    ///
    /// Takes over from an in-flight Focus session. The session start is
    /// kept only while the same Pomodoro session continues (paused or
    /// idle after a phase switch); a finished or foreign session starts fresh.
    pub fn start_pomodoro(&mut self, now_ms: u64) -> Option<Event> {
        if self.active_timer == Some(TimerKind::Focus) && self.is_in_flight() {
            debug!("pomodoro takes over an in-flight focus session");
        }
        self.begin_pomodoro_session();

        let duration_ms = self.pomodoro.duration_ms(self.pomodoro_mode);
        self.active_timer = Some(TimerKind::Pomodoro);
        self.status = TimerStatus::Running;
        self.end_at_ms = Some(now_ms.saturating_add(duration_ms));
        self.paused_remaining_ms = None;
        self.time_remaining_ms = duration_ms;
        self.total_work_ms = self.completed_work_ms;
        self.session_start_ms.get_or_insert(now_ms);

        debug!(mode = ?self.pomodoro_mode, duration_ms, "pomodoro started");
        Some(Event::TimerStarted {
            timer: TimerKind::Pomodoro,
            mode: Some(self.pomodoro_mode),
            duration_ms,
            at: timestamp(now_ms),
        })
    }

    /// Start a fresh Focus session. Never resumes a previous one.
    pub fn start_focus(&mut self, now_ms: u64) -> Option<Event> {
        if self.active_timer == Some(TimerKind::Pomodoro) && self.is_in_flight() {
            debug!("focus takes over an in-flight pomodoro session");
        }

        let duration_ms = self.focus.duration_ms;
        self.active_timer = Some(TimerKind::Focus);
        self.status = TimerStatus::Running;
        self.end_at_ms = Some(now_ms.saturating_add(duration_ms));
        self.paused_remaining_ms = None;
        self.time_remaining_ms = duration_ms;
        self.time_elapsed_ms = 0;
        self.distraction_count = 0;
        self.session_start_ms = Some(now_ms);

        debug!(kind = ?self.focus.focus_kind, duration_ms, "focus started");
        Some(Event::TimerStarted {
            timer: TimerKind::Focus,
            mode: None,
            duration_ms,
            at: timestamp(now_ms),
        })
    }

    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        let remaining = self.remaining_at(now_ms);
        self.time_remaining_ms = remaining;
        self.refresh_accumulators(now_ms);

        self.status = TimerStatus::Paused;
        self.end_at_ms = None;
        self.paused_remaining_ms = Some(remaining);
        Some(Event::TimerPaused {
            remaining_ms: remaining,
            at: timestamp(now_ms),
        })
    }

    pub fn resume(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != TimerStatus::Paused {
            return None;
        }
        let remaining = self.paused_remaining_ms.take().unwrap_or(0);
        self.status = TimerStatus::Running;
        self.end_at_ms = Some(now_ms.saturating_add(remaining));
        self.time_remaining_ms = remaining;
        Some(Event::TimerResumed {
            remaining_ms: remaining,
            at: timestamp(now_ms),
        })
    }

    /// Force the session to `Finished`.
    ///
    /// Accumulators are brought up to date first so the caller can record
    /// the worked or elapsed time.
    pub fn stop(&mut self, now_ms: u64) -> Option<Event> {
        if self.status == TimerStatus::Finished {
            return None;
        }
        let previous = self.status;
        if previous == TimerStatus::Running {
            self.time_remaining_ms = self.remaining_at(now_ms);
            self.refresh_accumulators(now_ms);
        }
        self.status = TimerStatus::Finished;
        self.end_at_ms = None;
        self.paused_remaining_ms = None;
        Some(Event::TimerStopped {
            timer: self.active_timer,
            previous,
            at: timestamp(now_ms),
        })
    }

    /// Return to `Idle` with the configured duration for the active timer.
    pub fn reset(&mut self, now_ms: u64) -> Option<Event> {
        self.status = TimerStatus::Idle;
        self.end_at_ms = None;
        self.paused_remaining_ms = None;
        self.session_start_ms = None;

        match self.active_timer {
            Some(TimerKind::Pomodoro) => {
                self.pomodoro_mode = PomodoroMode::Work;
                self.time_remaining_ms = self.pomodoro.work_duration_ms;
                self.completed_work_ms = 0;
                self.total_work_ms = 0;
            }
            Some(TimerKind::Focus) => {
                self.time_remaining_ms = self.focus.duration_ms;
                self.time_elapsed_ms = 0;
                self.distraction_count = 0;
            }
            None => {
                self.time_remaining_ms = 0;
            }
        }

        Some(Event::TimerReset {
            timer: self.active_timer,
            at: timestamp(now_ms),
        })
    }

    /// Select a Pomodoro phase. Discards any paused or finished countdown.
    pub fn switch_pomodoro_mode(&mut self, mode: PomodoroMode, now_ms: u64) -> Option<Event> {
        if self.status == TimerStatus::Running {
            return None;
        }
        self.begin_pomodoro_session();

        self.active_timer = Some(TimerKind::Pomodoro);
        self.pomodoro_mode = mode;
        self.time_remaining_ms = self.pomodoro.duration_ms(mode);
        self.total_work_ms = self.completed_work_ms;
        self.status = TimerStatus::Idle;
        self.end_at_ms = None;
        self.paused_remaining_ms = None;
        Some(Event::ModeSwitched {
            mode,
            at: timestamp(now_ms),
        })
    }

    /// Count a distraction. Only a running Deep focus session counts them.
    pub fn register_distraction(&mut self, now_ms: u64) -> Option<Event> {
        let counts = self.active_timer == Some(TimerKind::Focus)
            && self.focus.focus_kind == FocusKind::Deep
            && self.status == TimerStatus::Running;
        if !counts {
            return None;
        }
        self.distraction_count = self.distraction_count.saturating_add(1);
        Some(Event::DistractionRegistered {
            count: self.distraction_count,
            at: timestamp(now_ms),
        })
    }

    /// Call periodically. Returns `Some(Event)` when the countdown runs out.
    pub fn evaluate(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.time_remaining_ms = self.remaining_at(now_ms);
        self.refresh_accumulators(now_ms);
        if self.time_remaining_ms > 0 {
            return None;
        }

        match self.active_timer {
            Some(TimerKind::Pomodoro) => Some(self.complete_phase(now_ms)),
            Some(TimerKind::Focus) => Some(self.finish_focus(now_ms)),
            None => {
                self.status = TimerStatus::Finished;
                self.end_at_ms = None;
                None
            }
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    pub fn set_pomodoro_work_minutes(&mut self, minutes: u64, now_ms: u64) -> Option<Event> {
        let duration_ms = minutes_to_ms(clamp_minutes(minutes, WORK_MINUTES_RANGE));
        self.update_pomodoro(now_ms, |cfg| cfg.work_duration_ms = duration_ms)
    }

    pub fn set_pomodoro_break_minutes(&mut self, minutes: u64, now_ms: u64) -> Option<Event> {
        let duration_ms = minutes_to_ms(clamp_minutes(minutes, BREAK_MINUTES_RANGE));
        self.update_pomodoro(now_ms, |cfg| cfg.break_duration_ms = duration_ms)
    }

    pub fn set_auto_advance(&mut self, enabled: bool, now_ms: u64) -> Option<Event> {
        self.update_pomodoro(now_ms, |cfg| cfg.auto_advance = enabled)
    }

    pub fn set_focus_kind(&mut self, kind: FocusKind, now_ms: u64) -> Option<Event> {
        self.update_focus(now_ms, |cfg| cfg.focus_kind = kind)
    }

    pub fn set_focus_minutes(&mut self, minutes: u64, now_ms: u64) -> Option<Event> {
        let duration_ms = minutes_to_ms(clamp_minutes(minutes, FOCUS_MINUTES_RANGE));
        self.update_focus(now_ms, |cfg| cfg.duration_ms = duration_ms)
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Everything needed to rebuild this engine later.
    pub fn to_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            active_timer: self.active_timer,
            status: self.status,
            end_at_ms: self.end_at_ms,
            paused_remaining_ms: self.paused_remaining_ms,
            pomodoro: self.pomodoro,
            pomodoro_mode: self.pomodoro_mode,
            completed_work_ms: self.completed_work_ms,
            total_work_ms: self.total_work_ms,
            session_start_ms: self.session_start_ms,
            focus: self.focus,
            time_elapsed_ms: self.time_elapsed_ms,
            distraction_count: self.distraction_count,
        }
    }

    /// Rebuild an engine from a validated snapshot at wall-clock `now_ms`.
    ///
    /// A running countdown that expired meanwhile is adopted as `Finished`;
    /// phase transitions missed while the process was down are not replayed.
    pub fn from_snapshot(snapshot: &SessionSnapshot, now_ms: u64) -> (Self, RestoreOutcome) {
        let mut engine = Self::new(snapshot.pomodoro, snapshot.focus);
        engine.pomodoro_mode = snapshot.pomodoro_mode;

        match (snapshot.status, snapshot.active_timer) {
            (TimerStatus::Running, Some(kind)) => {
                let end_at = snapshot.end_at_ms.unwrap_or(0);
                engine.restore_session(snapshot, kind);
                if end_at > now_ms {
                    engine.status = TimerStatus::Running;
                    engine.end_at_ms = Some(end_at);
                    engine.time_remaining_ms = end_at - now_ms;
                    engine.refresh_accumulators(now_ms);
                    let remaining_ms = engine.time_remaining_ms;
                    (engine, RestoreOutcome::Running { remaining_ms })
                } else {
                    engine.status = TimerStatus::Finished;
                    engine.time_remaining_ms = 0;
                    // Settle the accumulators as of the moment it ran out.
                    engine.refresh_accumulators(end_at);
                    let overdue_ms = now_ms - end_at;
                    (engine, RestoreOutcome::Expired { overdue_ms })
                }
            }
            (TimerStatus::Paused, Some(kind)) => {
                let remaining_ms = snapshot.paused_remaining_ms.unwrap_or(0);
                engine.restore_session(snapshot, kind);
                engine.status = TimerStatus::Paused;
                engine.paused_remaining_ms = Some(remaining_ms);
                engine.time_remaining_ms = remaining_ms;
                (engine, RestoreOutcome::Paused { remaining_ms })
            }
            (TimerStatus::Idle, active) => {
                engine.active_timer = active;
                if active == Some(TimerKind::Pomodoro) {
                    // A phase switch keeps the session going.
                    engine.session_start_ms = snapshot.session_start_ms;
                    engine.completed_work_ms = snapshot.completed_work_ms;
                    engine.total_work_ms = snapshot.total_work_ms;
                }
                engine.time_remaining_ms = engine.current_duration_ms();
                (engine, RestoreOutcome::Idle)
            }
            _ => (engine, RestoreOutcome::Idle),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn remaining_at(&self, now_ms: u64) -> u64 {
        self.end_at_ms
            .map(|end_at| end_at.saturating_sub(now_ms))
            .unwrap_or(0)
    }

    /// Recompute the derived accumulators from `time_remaining_ms` and `now`.
    fn refresh_accumulators(&mut self, now_ms: u64) {
        match self.active_timer {
            Some(TimerKind::Focus) => {
                if let Some(start) = self.session_start_ms {
                    self.time_elapsed_ms = now_ms.saturating_sub(start);
                }
            }
            Some(TimerKind::Pomodoro) if self.pomodoro_mode == PomodoroMode::Work => {
                let worked = self
                    .pomodoro
                    .work_duration_ms
                    .saturating_sub(self.time_remaining_ms);
                self.total_work_ms = self.completed_work_ms.saturating_add(worked);
            }
            _ => {}
        }
    }

    fn complete_phase(&mut self, now_ms: u64) -> Event {
        let completed = self.pomodoro_mode;
        if completed == PomodoroMode::Work {
            self.completed_work_ms = self
                .completed_work_ms
                .saturating_add(self.pomodoro.work_duration_ms);
        }
        self.total_work_ms = self.completed_work_ms;

        let next = completed.next();
        let next_duration = self.pomodoro.duration_ms(next);
        self.pomodoro_mode = next;
        self.time_remaining_ms = next_duration;

        let auto_advanced = self.pomodoro.auto_advance;
        if auto_advanced {
            self.end_at_ms = Some(now_ms.saturating_add(next_duration));
        } else {
            self.status = TimerStatus::Paused;
            self.end_at_ms = None;
            self.paused_remaining_ms = Some(next_duration);
        }

        info!(?completed, ?next, auto_advanced, total_work_ms = self.total_work_ms, "pomodoro phase completed");
        Event::PhaseCompleted {
            completed,
            next,
            auto_advanced,
            total_work_ms: self.total_work_ms,
            at: timestamp(now_ms),
        }
    }

    fn finish_focus(&mut self, now_ms: u64) -> Event {
        self.status = TimerStatus::Finished;
        self.time_remaining_ms = 0;
        self.end_at_ms = None;

        info!(
            kind = ?self.focus.focus_kind,
            elapsed_ms = self.time_elapsed_ms,
            distractions = self.distraction_count,
            "focus session finished"
        );
        Event::FocusFinished {
            kind: self.focus.focus_kind,
            elapsed_ms: self.time_elapsed_ms,
            distractions: self.distraction_count,
            at: timestamp(now_ms),
        }
    }

    /// Reset the Pomodoro accumulators unless the same session continues.
    fn begin_pomodoro_session(&mut self) {
        let continuing = self.active_timer == Some(TimerKind::Pomodoro)
            && self.status != TimerStatus::Finished;
        if !continuing {
            self.session_start_ms = None;
            self.completed_work_ms = 0;
            self.total_work_ms = 0;
        }
    }

    fn restore_session(&mut self, snapshot: &SessionSnapshot, kind: TimerKind) {
        self.active_timer = Some(kind);
        self.completed_work_ms = snapshot.completed_work_ms;
        self.total_work_ms = snapshot.total_work_ms;
        self.session_start_ms = snapshot.session_start_ms;
        self.time_elapsed_ms = snapshot.time_elapsed_ms;
        self.distraction_count = snapshot.distraction_count;
    }

    fn update_pomodoro(
        &mut self,
        now_ms: u64,
        apply: impl FnOnce(&mut PomodoroConfig),
    ) -> Option<Event> {
        if self.active_timer == Some(TimerKind::Pomodoro) && self.is_in_flight() {
            debug!("pomodoro config change rejected while its countdown is in flight");
            return None;
        }
        let mut updated = self.pomodoro;
        apply(&mut updated);
        if updated == self.pomodoro {
            return None;
        }
        self.pomodoro = updated;
        if self.active_timer == Some(TimerKind::Pomodoro) && self.status == TimerStatus::Idle {
            self.time_remaining_ms = self.pomodoro.duration_ms(self.pomodoro_mode);
        }
        Some(self.config_updated(now_ms))
    }

    fn update_focus(&mut self, now_ms: u64, apply: impl FnOnce(&mut FocusConfig)) -> Option<Event> {
        if self.status != TimerStatus::Idle {
            debug!(status = ?self.status, "focus config change rejected outside idle");
            return None;
        }
        let mut updated = self.focus;
        apply(&mut updated);
        if updated == self.focus {
            return None;
        }
        self.focus = updated;
        if self.active_timer == Some(TimerKind::Focus) && self.status == TimerStatus::Idle {
            self.time_remaining_ms = self.focus.duration_ms;
        }
        Some(self.config_updated(now_ms))
    }

    fn config_updated(&self, now_ms: u64) -> Event {
        Event::ConfigUpdated {
            pomodoro: self.pomodoro,
            focus: self.focus,
            at: timestamp(now_ms),
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(PomodoroConfig::default(), FocusConfig::default())
    }
}
