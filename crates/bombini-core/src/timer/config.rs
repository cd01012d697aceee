use serde::{Deserialize, Serialize};

/// Bounds for a Pomodoro work phase, in minutes.
pub const WORK_MINUTES_RANGE: (u64, u64) = (15, 90);
/// Bounds for a Pomodoro break phase, in minutes.
pub const BREAK_MINUTES_RANGE: (u64, u64) = (5, 20);
/// Bounds for a Focus session, in minutes.
pub const FOCUS_MINUTES_RANGE: (u64, u64) = (15, 180);

pub const DEFAULT_WORK_MINUTES: u64 = 25;
pub const DEFAULT_BREAK_MINUTES: u64 = 5;
pub const DEFAULT_FOCUS_MINUTES: u64 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroMode {
    #[default]
    Work,
    Break,
}

impl PomodoroMode {
    /// The phase that follows this one.
    pub fn next(self) -> Self {
        match self {
            PomodoroMode::Work => PomodoroMode::Break,
            PomodoroMode::Break => PomodoroMode::Work,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusKind {
    #[default]
    Deep,
    Shallow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    pub work_duration_ms: u64,
    pub break_duration_ms: u64,
    pub auto_advance: bool,
}

impl PomodoroConfig {
    /// Build a config from minutes, clamping each phase into its bounds.
    pub fn from_minutes(work_min: u64, break_min: u64, auto_advance: bool) -> Self {
        Self {
            work_duration_ms: minutes_to_ms(clamp_minutes(work_min, WORK_MINUTES_RANGE)),
            break_duration_ms: minutes_to_ms(clamp_minutes(break_min, BREAK_MINUTES_RANGE)),
            auto_advance,
        }
    }

    /// Duration of the given phase in milliseconds.
    pub fn duration_ms(&self, mode: PomodoroMode) -> u64 {
        match mode {
            PomodoroMode::Work => self.work_duration_ms,
            PomodoroMode::Break => self.break_duration_ms,
        }
    }
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_WORK_MINUTES, DEFAULT_BREAK_MINUTES, true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusConfig {
    pub focus_kind: FocusKind,
    pub duration_ms: u64,
}

impl FocusConfig {
    pub fn from_minutes(focus_kind: FocusKind, duration_min: u64) -> Self {
        Self {
            focus_kind,
            duration_ms: minutes_to_ms(clamp_minutes(duration_min, FOCUS_MINUTES_RANGE)),
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self::from_minutes(FocusKind::Deep, DEFAULT_FOCUS_MINUTES)
    }
}

pub fn clamp_minutes(minutes: u64, (min, max): (u64, u64)) -> u64 {
    minutes.clamp(min, max)
}

/// Convert minutes to milliseconds.
///
/// Uses saturating arithmetic so absurd inputs cannot overflow.
pub fn minutes_to_ms(minutes: u64) -> u64 {
    minutes.saturating_mul(60).saturating_mul(1000)
}
