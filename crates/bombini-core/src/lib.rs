//! # Bombini Core Library
//!
//! This library provides the timer core of Bombini: a drift-free countdown
//! shared by Pomodoro work/break cycles and single-shot Focus sessions. It
//! follows a CLI-first philosophy where every operation is available through
//! the standalone `bombini` binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine. Every operation takes
//!   `now` explicitly and remaining time is always `end_at - now`, so skipped
//!   or throttled ticks never cause drift
//! - **Service**: The single owner of the engine; persists a snapshot after
//!   each state change and publishes views on a `watch` channel
//! - **Driver**: The engine tick and the title tick in one async loop
//! - **Display**: Countdown formatting, labels, and the terminal title updater
//! - **Storage**: SQLite for the snapshot slot and session history, TOML for
//!   user configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerService`]: Process-wide owner of the engine
//! - [`Database`]: Snapshot slot and session history
//! - [`Config`]: Application configuration management

pub mod display;
pub mod driver;
pub mod error;
pub mod events;
pub mod service;
pub mod storage;
pub mod timer;

pub use driver::DriverConfig;
pub use error::{ConfigError, CoreError, DatabaseError, SnapshotError};
pub use events::Event;
pub use service::{Command, TimerService};
pub use storage::{Config, Database, Persistence, SnapshotStore};
pub use timer::{
    Clock, FocusKind, PomodoroMode, RestoreOutcome, SystemClock, TimerEngine, TimerKind,
    TimerStatus, TimerView,
};
