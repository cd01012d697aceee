//! The timer service.
//!
//! `TimerService` is the one owner of the engine for the whole process. It
//! reads the clock, routes every mutation through the engine, persists or
//! clears the snapshot after each state change, and publishes a fresh
//! [`TimerView`] on a `watch` channel for any number of subscribers.

use tokio::sync::watch;
use tracing::debug;

use crate::events::Event;
use crate::storage::Persistence;
use crate::timer::{
    Clock, FocusConfig, FocusKind, PomodoroConfig, PomodoroMode, RestoreOutcome, SystemClock,
    TimerEngine, TimerStatus, TimerView,
};

/// A user action, as sent to the service or through the driver's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartPomodoro,
    StartFocus,
    Pause,
    Resume,
    Stop,
    Reset,
    SwitchMode(PomodoroMode),
    Distraction,
    SetWorkMinutes(u64),
    SetBreakMinutes(u64),
    SetAutoAdvance(bool),
    SetFocusKind(FocusKind),
    SetFocusMinutes(u64),
}

pub struct TimerService<C: Clock = SystemClock> {
    engine: TimerEngine,
    persistence: Persistence,
    clock: C,
    tx: watch::Sender<TimerView>,
    restored: RestoreOutcome,
}

impl<C: Clock> TimerService<C> {
    /// Build the service from whatever the snapshot slot holds.
    ///
    /// `pomodoro` and `focus` only apply when nothing usable was persisted.
    pub fn restore(
        persistence: Persistence,
        clock: C,
        pomodoro: PomodoroConfig,
        focus: FocusConfig,
    ) -> Self {
        let (engine, restored) = persistence.restore(pomodoro, focus, clock.now_ms());
        let (tx, _rx) = watch::channel(TimerView::of(&engine));
        Self {
            engine,
            persistence,
            clock,
            tx,
            restored,
        }
    }

    pub fn restore_outcome(&self) -> RestoreOutcome {
        self.restored
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn view(&self) -> TimerView {
        TimerView::of(&self.engine)
    }

    /// A receiver that sees every published view change.
    pub fn subscribe(&self) -> watch::Receiver<TimerView> {
        self.tx.subscribe()
    }

    pub fn start_pomodoro(&mut self) -> Option<Event> {
        self.run(|engine, now| engine.start_pomodoro(now))
    }

    pub fn start_focus(&mut self) -> Option<Event> {
        self.run(|engine, now| engine.start_focus(now))
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.run(|engine, now| engine.pause(now))
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.run(|engine, now| engine.resume(now))
    }

    pub fn stop(&mut self) -> Option<Event> {
        self.run(|engine, now| engine.stop(now))
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.run(|engine, now| engine.reset(now))
    }

    pub fn switch_pomodoro_mode(&mut self, mode: PomodoroMode) -> Option<Event> {
        self.run(|engine, now| engine.switch_pomodoro_mode(mode, now))
    }

    pub fn register_distraction(&mut self) -> Option<Event> {
        self.run(|engine, now| engine.register_distraction(now))
    }

    pub fn set_pomodoro_work_minutes(&mut self, minutes: u64) -> Option<Event> {
        self.run(|engine, now| engine.set_pomodoro_work_minutes(minutes, now))
    }

    pub fn set_pomodoro_break_minutes(&mut self, minutes: u64) -> Option<Event> {
        self.run(|engine, now| engine.set_pomodoro_break_minutes(minutes, now))
    }

    pub fn set_auto_advance(&mut self, enabled: bool) -> Option<Event> {
        self.run(|engine, now| engine.set_auto_advance(enabled, now))
    }

    pub fn set_focus_kind(&mut self, kind: FocusKind) -> Option<Event> {
        self.run(|engine, now| engine.set_focus_kind(kind, now))
    }

    pub fn set_focus_minutes(&mut self, minutes: u64) -> Option<Event> {
        self.run(|engine, now| engine.set_focus_minutes(minutes, now))
    }

    /// Re-evaluate the countdown against the clock. Called by the engine tick.
    pub fn tick(&mut self) -> Option<Event> {
        self.run(|engine, now| engine.evaluate(now))
    }

    pub fn apply(&mut self, command: Command) -> Option<Event> {
        match command {
            Command::StartPomodoro => self.start_pomodoro(),
            Command::StartFocus => self.start_focus(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Stop => self.stop(),
            Command::Reset => self.reset(),
            Command::SwitchMode(mode) => self.switch_pomodoro_mode(mode),
            Command::Distraction => self.register_distraction(),
            Command::SetWorkMinutes(minutes) => self.set_pomodoro_work_minutes(minutes),
            Command::SetBreakMinutes(minutes) => self.set_pomodoro_break_minutes(minutes),
            Command::SetAutoAdvance(enabled) => self.set_auto_advance(enabled),
            Command::SetFocusKind(kind) => self.set_focus_kind(kind),
            Command::SetFocusMinutes(minutes) => self.set_focus_minutes(minutes),
        }
    }

    fn run(&mut self, op: impl FnOnce(&mut TimerEngine, u64) -> Option<Event>) -> Option<Event> {
        let now_ms = self.clock.now_ms();
        let event = op(&mut self.engine, now_ms);

        if let Some(event) = &event {
            debug!(?event, "timer event");
            let ended = self.engine.status() == TimerStatus::Finished
                || matches!(event, Event::TimerReset { .. });
            if ended {
                self.persistence.clear();
            } else {
                self.persistence.persist(&self.engine);
            }
        }

        self.publish();
        event
    }

    fn publish(&self) {
        let view = TimerView::of(&self.engine);
        self.tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
