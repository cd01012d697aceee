use serde::Serialize;

use super::config::{FocusConfig, PomodoroConfig, PomodoroMode};
use super::engine::{TimerEngine, TimerKind, TimerStatus};
use crate::display::format::{format_countdown, progress_pct, timer_label};

/// Read-only projection of the timer session.
///
/// This is what pages, widgets and the title updater consume; none of them
/// touch the engine directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    pub active_timer: Option<TimerKind>,
    pub status: TimerStatus,
    pub time_remaining_ms: u64,
    pub time_elapsed_ms: u64,
    pub distraction_count: u32,
    pub pomodoro_mode: PomodoroMode,
    pub pomodoro: PomodoroConfig,
    pub focus: FocusConfig,
    pub total_work_ms: u64,
    pub session_start_ms: Option<u64>,
    pub end_at_ms: Option<u64>,
    pub paused_remaining_ms: Option<u64>,
    /// Length of the countdown currently shown.
    pub duration_ms: u64,
    pub progress_pct: f64,
    pub label: String,
    pub countdown: String,
}

impl TimerView {
    pub fn of(engine: &TimerEngine) -> Self {
        let focus = engine.focus_config();
        let duration_ms = engine.current_duration_ms();
        Self {
            active_timer: engine.active_timer(),
            status: engine.status(),
            time_remaining_ms: engine.time_remaining_ms(),
            time_elapsed_ms: engine.time_elapsed_ms(),
            distraction_count: engine.distraction_count(),
            pomodoro_mode: engine.pomodoro_mode(),
            pomodoro: engine.pomodoro_config(),
            focus,
            total_work_ms: engine.total_work_ms(),
            session_start_ms: engine.session_start_ms(),
            end_at_ms: engine.end_at_ms(),
            paused_remaining_ms: engine.paused_remaining_ms(),
            duration_ms,
            progress_pct: progress_pct(engine.time_remaining_ms(), duration_ms),
            label: timer_label(engine.active_timer(), engine.pomodoro_mode(), focus.focus_kind)
                .to_string(),
            countdown: format_countdown(engine.time_remaining_ms()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }
}

impl Default for TimerView {
    fn default() -> Self {
        Self::of(&TimerEngine::default())
    }
}
