mod clock;
mod config;
mod engine;
mod snapshot;
mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    minutes_to_ms, FocusConfig, FocusKind, PomodoroConfig, PomodoroMode, BREAK_MINUTES_RANGE,
    DEFAULT_BREAK_MINUTES, DEFAULT_FOCUS_MINUTES, DEFAULT_WORK_MINUTES, FOCUS_MINUTES_RANGE,
    WORK_MINUTES_RANGE,
};
pub use engine::{TimerEngine, TimerKind, TimerStatus};
pub use snapshot::{RestoreOutcome, SessionSnapshot, SNAPSHOT_VERSION};
pub use view::TimerView;
