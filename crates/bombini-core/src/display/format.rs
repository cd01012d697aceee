use crate::timer::{FocusKind, PomodoroMode, TimerKind, TimerStatus, TimerView};

pub const PAUSED_LABEL: &str = "Paused";

/// Format milliseconds as `MM:SS`, or `H:MM:SS` from one hour on.
///
/// Partial seconds are truncated.
pub fn format_countdown(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}

/// Human label for the current timer.
pub fn timer_label(
    active_timer: Option<TimerKind>,
    pomodoro_mode: PomodoroMode,
    focus_kind: FocusKind,
) -> &'static str {
    match (active_timer, pomodoro_mode, focus_kind) {
        (Some(TimerKind::Pomodoro), PomodoroMode::Work, _) => "Time to focus!",
        (Some(TimerKind::Pomodoro), PomodoroMode::Break, _) => "Break",
        (Some(TimerKind::Focus), _, FocusKind::Deep) => "Deep Work",
        (Some(TimerKind::Focus), _, FocusKind::Shallow) => "Shallow Work",
        (None, _, _) => "",
    }
}

/// 0.0 .. 100.0 progress through a countdown of `total_ms`.
pub fn progress_pct(remaining_ms: u64, total_ms: u64) -> f64 {
    if total_ms == 0 {
        return 0.0;
    }
    let done = total_ms.saturating_sub(remaining_ms);
    (done as f64 * 100.0 / total_ms as f64).min(100.0)
}

/// Window or tab title for a view. Idle and finished timers show `original`.
pub fn title_text(view: &TimerView, original: &str) -> String {
    match (view.status, view.active_timer) {
        (TimerStatus::Running, Some(_)) => format!("{} – {}", view.countdown, view.label),
        (TimerStatus::Paused, Some(_)) => format!("{} – {PAUSED_LABEL}", view.countdown),
        _ => original.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerEngine;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(999), "00:00");
        assert_eq!(format_countdown(65_000), "01:05");
        assert_eq!(format_countdown(25 * 60 * 1000), "25:00");
        assert_eq!(format_countdown(59 * 60 * 1000 + 59_999), "59:59");
    }

    #[test]
    fn formats_hours_beyond_sixty_minutes() {
        assert_eq!(format_countdown(60 * 60 * 1000), "1:00:00");
        assert_eq!(format_countdown(180 * 60 * 1000), "3:00:00");
        assert_eq!(format_countdown(3_725_000), "1:02:05");
    }

    #[test]
    fn labels_follow_timer_and_mode() {
        assert_eq!(
            timer_label(Some(TimerKind::Pomodoro), PomodoroMode::Work, FocusKind::Deep),
            "Time to focus!"
        );
        assert_eq!(
            timer_label(Some(TimerKind::Pomodoro), PomodoroMode::Break, FocusKind::Deep),
            "Break"
        );
        assert_eq!(
            timer_label(Some(TimerKind::Focus), PomodoroMode::Break, FocusKind::Deep),
            "Deep Work"
        );
        assert_eq!(
            timer_label(Some(TimerKind::Focus), PomodoroMode::Work, FocusKind::Shallow),
            "Shallow Work"
        );
        assert_eq!(timer_label(None, PomodoroMode::Work, FocusKind::Deep), "");
    }

    #[test]
    fn progress_is_bounded() {
        assert_eq!(progress_pct(0, 0), 0.0);
        assert_eq!(progress_pct(100, 100), 0.0);
        assert_eq!(progress_pct(25, 100), 75.0);
        assert_eq!(progress_pct(0, 100), 100.0);
        assert_eq!(progress_pct(500, 100), 0.0);
    }

    #[test]
    fn title_variants() {
        let mut engine = TimerEngine::default();
        assert_eq!(title_text(&TimerView::of(&engine), "Bombini"), "Bombini");

        engine.start_focus(0);
        assert_eq!(title_text(&TimerView::of(&engine), "Bombini"), "45:00 – Deep Work");

        engine.pause(60_000);
        assert_eq!(title_text(&TimerView::of(&engine), "Bombini"), "44:00 – Paused");

        engine.stop(60_000);
        assert_eq!(title_text(&TimerView::of(&engine), "Bombini"), "Bombini");
    }
}
