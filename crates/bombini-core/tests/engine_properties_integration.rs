//! Integration tests for the timer engine.
//!
//! Walks Pomodoro and Focus sessions end to end against explicit wall-clock
//! instants, including throttled ticks and clock jumps.

use bombini_core::timer::{minutes_to_ms, FocusConfig, PomodoroConfig};
use bombini_core::{Event, FocusKind, PomodoroMode, TimerEngine, TimerKind, TimerStatus};
use proptest::prelude::*;

const MIN: u64 = 60_000;
const T0: u64 = 1_700_000_000_000;

fn pomodoro(auto_advance: bool) -> TimerEngine {
    TimerEngine::new(
        PomodoroConfig::from_minutes(25, 5, auto_advance),
        FocusConfig::default(),
    )
}

#[test]
fn test_pomodoro_auto_advance_conserves_work() {
    let mut engine = pomodoro(true);
    engine.start_pomodoro(T0).unwrap();

    // Sparse, irregular ticks through the first Work phase.
    for t in [1, 7 * MIN, 13 * MIN + 250, 24 * MIN + 59_999] {
        assert!(engine.evaluate(T0 + t).is_none());
        assert_eq!(engine.status(), TimerStatus::Running);
    }

    let event = engine.evaluate(T0 + 25 * MIN).unwrap();
    assert!(matches!(
        event,
        Event::PhaseCompleted {
            completed: PomodoroMode::Work,
            next: PomodoroMode::Break,
            auto_advanced: true,
            ..
        }
    ));
    assert_eq!(engine.status(), TimerStatus::Running);
    assert_eq!(engine.pomodoro_mode(), PomodoroMode::Break);
    assert_eq!(engine.end_at_ms(), Some(T0 + 30 * MIN));

    engine.evaluate(T0 + 28 * MIN);
    assert_eq!(engine.status(), TimerStatus::Running);
    assert_eq!(engine.total_work_ms(), 25 * MIN);

    engine.evaluate(T0 + 30 * MIN).unwrap();
    assert_eq!(engine.pomodoro_mode(), PomodoroMode::Work);
    assert_eq!(engine.status(), TimerStatus::Running);
    assert_eq!(engine.total_work_ms(), 25 * MIN);

    // The in-progress Work phase counts while it runs.
    engine.evaluate(T0 + 40 * MIN);
    assert_eq!(engine.total_work_ms(), 35 * MIN);
}

#[test]
fn test_pomodoro_manual_advance_pauses_at_boundary() {
    let mut engine = pomodoro(false);
    engine.start_pomodoro(T0).unwrap();

    engine.evaluate(T0 + 25 * MIN).unwrap();
    assert_eq!(engine.status(), TimerStatus::Paused);
    assert_eq!(engine.pomodoro_mode(), PomodoroMode::Break);
    assert_eq!(engine.paused_remaining_ms(), Some(5 * MIN));
    assert_eq!(engine.end_at_ms(), None);

    // Nothing moves while paused at the boundary.
    assert!(engine.evaluate(T0 + 60 * MIN).is_none());
    assert_eq!(engine.time_remaining_ms(), 5 * MIN);

    engine.resume(T0 + 60 * MIN).unwrap();
    assert_eq!(engine.end_at_ms(), Some(T0 + 65 * MIN));
}

#[test]
fn test_focus_session_is_terminal() {
    let mut engine = TimerEngine::default();
    engine.set_focus_kind(FocusKind::Deep, T0);
    engine.set_focus_minutes(15, T0).unwrap();
    engine.start_focus(T0).unwrap();

    for minute in [2, 5, 11] {
        engine.evaluate(T0 + minute * MIN);
        assert!(engine.register_distraction(T0 + minute * MIN).is_some());
    }

    let event = engine.evaluate(T0 + 15 * MIN).unwrap();
    assert!(event.is_completion());
    assert_eq!(engine.status(), TimerStatus::Finished);
    assert_eq!(engine.distraction_count(), 3);
    assert_eq!(engine.time_elapsed_ms(), 15 * MIN);
    assert_eq!(engine.time_remaining_ms(), 0);
    assert_eq!(engine.end_at_ms(), None);

    // Terminal: later ticks and distractions do nothing.
    assert!(engine.evaluate(T0 + 20 * MIN).is_none());
    assert!(engine.register_distraction(T0 + 20 * MIN).is_none());
}

#[test]
fn test_shallow_focus_ignores_distractions() {
    let mut engine = TimerEngine::default();
    engine.set_focus_kind(FocusKind::Shallow, T0).unwrap();
    engine.start_focus(T0).unwrap();
    assert!(engine.register_distraction(T0 + MIN).is_none());
    assert_eq!(engine.distraction_count(), 0);
}

#[test]
fn test_clock_jump_finishes_immediately() {
    let mut engine = TimerEngine::default();
    engine.start_focus(T0).unwrap();
    // The machine slept through the whole session.
    let event = engine.evaluate(T0 + 10 * 60 * MIN).unwrap();
    assert!(matches!(event, Event::FocusFinished { .. }));
    assert_eq!(engine.time_remaining_ms(), 0);
}

#[test]
fn test_clock_going_backwards_never_overflows() {
    let mut engine = TimerEngine::default();
    engine.start_focus(T0).unwrap();
    assert!(engine.evaluate(T0 - 5 * MIN).is_none());
    assert_eq!(engine.time_remaining_ms(), 50 * MIN);
    assert_eq!(engine.time_elapsed_ms(), 0);
}

#[test]
fn test_config_guard_clamps_and_rejects() {
    let mut engine = TimerEngine::default();
    engine.set_focus_minutes(200, T0).unwrap();
    assert_eq!(engine.focus_config().duration_ms, minutes_to_ms(180));

    engine.start_focus(T0).unwrap();
    let before = engine.clone();
    assert!(engine.set_focus_minutes(30, T0 + 1).is_none());
    assert!(engine.set_focus_kind(FocusKind::Shallow, T0 + 1).is_none());
    assert_eq!(engine, before);
}

#[test]
fn test_guarded_ops_leave_idle_state_untouched() {
    let mut engine = TimerEngine::default();
    let before = engine.clone();
    assert!(engine.resume(T0).is_none());
    assert!(engine.pause(T0).is_none());
    assert!(engine.evaluate(T0).is_none());
    assert!(engine.register_distraction(T0).is_none());
    assert_eq!(engine, before);
}

#[test]
fn test_focus_takes_over_pomodoro() {
    let mut engine = pomodoro(true);
    engine.start_pomodoro(T0).unwrap();
    engine.start_focus(T0 + 10 * MIN).unwrap();
    assert_eq!(engine.active_timer(), Some(TimerKind::Focus));
    assert_eq!(engine.end_at_ms(), Some(T0 + 55 * MIN));

    // A new Pomodoro after the takeover starts from a clean slate.
    engine.start_pomodoro(T0 + 20 * MIN).unwrap();
    assert_eq!(engine.session_start_ms(), Some(T0 + 20 * MIN));
    assert_eq!(engine.total_work_ms(), 0);
}

#[test]
fn test_reset_returns_to_configured_work_phase() {
    let mut engine = pomodoro(false);
    engine.start_pomodoro(T0).unwrap();
    engine.evaluate(T0 + 25 * MIN).unwrap();
    assert_eq!(engine.pomodoro_mode(), PomodoroMode::Break);

    engine.reset(T0 + 26 * MIN).unwrap();
    assert_eq!(engine.status(), TimerStatus::Idle);
    assert_eq!(engine.pomodoro_mode(), PomodoroMode::Work);
    assert_eq!(engine.time_remaining_ms(), 25 * MIN);
    assert_eq!(engine.total_work_ms(), 0);
    assert_eq!(engine.session_start_ms(), None);
}

proptest! {
    #[test]
    fn remaining_never_drifts(
        duration_min in 15u64..=180,
        mut offsets in prop::collection::vec(0u64..200 * MIN, 1..40),
    ) {
        let mut engine = TimerEngine::new(
            PomodoroConfig::default(),
            FocusConfig::from_minutes(FocusKind::Shallow, duration_min),
        );
        engine.start_focus(T0).unwrap();
        let end_at = T0 + minutes_to_ms(duration_min);
        offsets.sort_unstable();

        for offset in offsets {
            let now = T0 + offset;
            engine.evaluate(now);
            prop_assert_eq!(engine.time_remaining_ms(), end_at.saturating_sub(now));
            if now >= end_at {
                prop_assert_eq!(engine.status(), TimerStatus::Finished);
                break;
            }
        }
    }

    #[test]
    fn pause_resume_conserves_budget(
        run_before in 0u64..45 * MIN,
        paused_for in 0u64..24 * 60 * MIN,
    ) {
        let mut engine = TimerEngine::default();
        engine.start_focus(T0).unwrap();
        let budget = 45 * MIN;

        engine.pause(T0 + run_before).unwrap();
        prop_assert_eq!(engine.paused_remaining_ms(), Some(budget - run_before));

        let resumed_at = T0 + run_before + paused_for;
        engine.resume(resumed_at).unwrap();
        prop_assert_eq!(engine.end_at_ms(), Some(resumed_at + budget - run_before));
        prop_assert_eq!(engine.time_remaining_ms(), budget - run_before);
    }
}
