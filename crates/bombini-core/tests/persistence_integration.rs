//! Integration tests for snapshot persistence across restarts.
//!
//! Each "process" is a fresh `TimerService` opened on the same on-disk
//! database, with a `ManualClock` standing in for the time that passed
//! while nothing was running.

use std::path::Path;

use bombini_core::storage::{Database, Persistence, SnapshotStore};
use bombini_core::timer::{FocusConfig, ManualClock, PomodoroConfig};
use bombini_core::{
    Clock, Event, PomodoroMode, RestoreOutcome, TimerKind, TimerService, TimerStatus,
};

const MIN: u64 = 60_000;

fn open(path: &Path, clock: &ManualClock) -> TimerService<ManualClock> {
    let db = Database::open_at(path).unwrap();
    TimerService::restore(
        Persistence::new(db),
        clock.clone(),
        PomodoroConfig::default(),
        FocusConfig::default(),
    )
}

fn slot(path: &Path) -> Option<String> {
    Database::open_at(path).unwrap().load().unwrap()
}

#[test]
fn test_restore_mid_countdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bombini.db");
    let clock = ManualClock::new(1_000 * MIN);

    {
        let mut service = open(&path, &clock);
        service.start_pomodoro().unwrap();
        clock.advance(5 * MIN);
        service.tick();
    }

    // Reopened ten minutes later.
    clock.advance(10 * MIN);
    let service = open(&path, &clock);
    assert_eq!(
        service.restore_outcome(),
        RestoreOutcome::Running { remaining_ms: 10 * MIN }
    );
    let view = service.view();
    assert_eq!(view.status, TimerStatus::Running);
    assert_eq!(view.active_timer, Some(TimerKind::Pomodoro));
    assert_eq!(view.time_remaining_ms, 10 * MIN);
    assert_eq!(view.total_work_ms, 15 * MIN);
}

#[test]
fn test_restore_after_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bombini.db");
    let clock = ManualClock::new(1_000 * MIN);

    {
        let mut service = open(&path, &clock);
        service.start_pomodoro().unwrap();
    }

    clock.advance(90 * MIN);
    let mut service = open(&path, &clock);
    assert_eq!(
        service.restore_outcome(),
        RestoreOutcome::Expired { overdue_ms: 65 * MIN }
    );
    assert_eq!(service.view().status, TimerStatus::Finished);
    assert_eq!(service.view().time_remaining_ms, 0);
    // No replay of the missed phase change.
    assert_eq!(service.view().pomodoro_mode, PomodoroMode::Work);
    assert!(slot(&path).is_none());

    assert!(service.tick().is_none());
}

#[test]
fn test_paused_session_restores_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bombini.db");
    let clock = ManualClock::new(1_000 * MIN);

    {
        let mut service = open(&path, &clock);
        service.start_focus().unwrap();
        clock.advance(20 * MIN);
        service.register_distraction().unwrap();
        service.pause().unwrap();
    }

    clock.advance(24 * 60 * MIN);
    let mut service = open(&path, &clock);
    assert_eq!(
        service.restore_outcome(),
        RestoreOutcome::Paused { remaining_ms: 25 * MIN }
    );
    assert_eq!(service.view().distraction_count, 1);
    assert_eq!(service.view().countdown, "25:00");

    service.resume().unwrap();
    assert_eq!(service.view().end_at_ms, Some(clock.now_ms() + 25 * MIN));
}

#[test]
fn test_corrupt_snapshot_falls_back_to_idle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bombini.db");
    Database::open_at(&path)
        .unwrap()
        .save(r#"{"version":1,"status":"running","active_timer":"focus"}"#)
        .unwrap();

    let clock = ManualClock::new(0);
    let service = open(&path, &clock);
    assert_eq!(service.restore_outcome(), RestoreOutcome::Discarded);
    assert_eq!(service.view().status, TimerStatus::Idle);
    assert_eq!(service.view().active_timer, None);
    assert!(slot(&path).is_none());
}

#[test]
fn test_stop_clears_slot_and_reports_accumulators() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bombini.db");
    let clock = ManualClock::new(0);

    let mut service = open(&path, &clock);
    service.start_pomodoro().unwrap();
    clock.advance(12 * MIN);
    let event = service.stop().unwrap();
    assert!(matches!(
        event,
        Event::TimerStopped {
            timer: Some(TimerKind::Pomodoro),
            previous: TimerStatus::Running,
            ..
        }
    ));
    assert_eq!(service.engine().total_work_ms(), 12 * MIN);
    assert!(slot(&path).is_none());

    drop(service);
    let service = open(&path, &clock);
    assert_eq!(service.restore_outcome(), RestoreOutcome::Empty);
}

#[test]
fn test_idle_config_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bombini.db");
    let clock = ManualClock::new(0);

    {
        let mut service = open(&path, &clock);
        service.set_pomodoro_work_minutes(50).unwrap();
        service.switch_pomodoro_mode(PomodoroMode::Work).unwrap();
    }

    let service = open(&path, &clock);
    assert_eq!(service.restore_outcome(), RestoreOutcome::Idle);
    assert_eq!(service.view().countdown, "50:00");
    assert_eq!(service.view().active_timer, Some(TimerKind::Pomodoro));
}
