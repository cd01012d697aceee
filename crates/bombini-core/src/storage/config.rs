//! TOML-based user configuration.
//!
//! Stores user preferences including:
//! - Pomodoro work/break lengths and auto-advance
//! - Focus session kind and length
//! - Title and tick cadence for the terminal display
//! - End-of-session bell
//!
//! Configuration is stored at `~/.config/bombini/config.toml`. The values
//! seed a fresh timer engine; a restored session keeps its own settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{
    FocusConfig, FocusKind, PomodoroConfig, BREAK_MINUTES_RANGE, DEFAULT_BREAK_MINUTES,
    DEFAULT_FOCUS_MINUTES, DEFAULT_WORK_MINUTES, FOCUS_MINUTES_RANGE, WORK_MINUTES_RANGE,
};

const ENGINE_TICK_RANGE_MS: (u64, u64) = (100, 1000);
const MIN_TITLE_TICK_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSettings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u64,
    #[serde(default = "default_true")]
    pub auto_advance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSettings {
    #[serde(default)]
    pub kind: FocusKind,
    #[serde(default = "default_focus_minutes")]
    pub duration_minutes: u64,
}

/// Terminal display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Title shown while no countdown is running.
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_engine_tick_ms")]
    pub engine_tick_ms: u64,
    #[serde(default = "default_title_tick_ms")]
    pub title_tick_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Ring the terminal bell when a phase or focus session ends.
    #[serde(default = "default_true")]
    pub bell: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/bombini/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pomodoro: PomodoroSettings,
    #[serde(default)]
    pub focus: FocusSettings,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_work_minutes() -> u64 {
    DEFAULT_WORK_MINUTES
}
fn default_break_minutes() -> u64 {
    DEFAULT_BREAK_MINUTES
}
fn default_focus_minutes() -> u64 {
    DEFAULT_FOCUS_MINUTES
}
fn default_true() -> bool {
    true
}
fn default_title() -> String {
    "bombini".into()
}
fn default_engine_tick_ms() -> u64 {
    100
}
fn default_title_tick_ms() -> u64 {
    1000
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            auto_advance: true,
        }
    }
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            kind: FocusKind::Deep,
            duration_minutes: default_focus_minutes(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            engine_tick_ms: default_engine_tick_ms(),
            title_tick_ms: default_title_tick_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { bell: true }
    }
}

impl DisplayConfig {
    /// Engine evaluation interval, clamped to 100..=1000 ms.
    pub fn engine_tick(&self) -> Duration {
        let (min, max) = ENGINE_TICK_RANGE_MS;
        Duration::from_millis(self.engine_tick_ms.clamp(min, max))
    }

    pub fn title_tick(&self) -> Duration {
        Duration::from_millis(self.title_tick_ms.max(MIN_TITLE_TICK_MS))
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("{e}")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn collect_leaves(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::collect_leaves(&key, v, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    /// `<data dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the defaults cannot
    /// be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default configuration: {e}");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the value is outside its allowed range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every leaf setting as `(dot.path, value)`, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::collect_leaves("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Check the minute bounds of the timer settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` naming the first out-of-range setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("pomodoro.work_minutes", self.pomodoro.work_minutes, WORK_MINUTES_RANGE)?;
        check_range("pomodoro.break_minutes", self.pomodoro.break_minutes, BREAK_MINUTES_RANGE)?;
        check_range(
            "focus.duration_minutes",
            self.focus.duration_minutes,
            FOCUS_MINUTES_RANGE,
        )?;
        Ok(())
    }

    /// Pomodoro settings for a fresh engine. Out-of-range minutes are clamped.
    pub fn pomodoro_config(&self) -> PomodoroConfig {
        PomodoroConfig::from_minutes(
            self.pomodoro.work_minutes,
            self.pomodoro.break_minutes,
            self.pomodoro.auto_advance,
        )
    }

    /// Focus settings for a fresh engine. Out-of-range minutes are clamped.
    pub fn focus_config(&self) -> FocusConfig {
        FocusConfig::from_minutes(self.focus.kind, self.focus.duration_minutes)
    }
}

fn check_range(key: &str, value: u64, (min, max): (u64, u64)) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value} is outside {min}..={max}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::minutes_to_ms;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.pomodoro.work_minutes, 25);
        assert_eq!(parsed.focus.kind, FocusKind::Deep);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("[pomodoro]\nwork_minutes = 50\n").unwrap();
        assert_eq!(cfg.pomodoro.work_minutes, 50);
        assert_eq!(cfg.pomodoro.break_minutes, 5);
        assert!(cfg.pomodoro.auto_advance);
        assert_eq!(cfg.focus.duration_minutes, 45);
        assert!(cfg.notifications.bell);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("pomodoro.work_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("pomodoro.auto_advance").as_deref(), Some("true"));
        assert_eq!(cfg.get("focus.kind").as_deref(), Some("deep"));
        assert!(cfg.get("pomodoro.missing_key").is_none());
        assert!(cfg.get("pomodoro").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("pomodoro.break_minutes", "10").unwrap();
        cfg.set("notifications.bell", "false").unwrap();
        cfg.set("focus.kind", "shallow").unwrap();
        cfg.set("display.title", "zsh").unwrap();
        assert_eq!(cfg.pomodoro.break_minutes, 10);
        assert!(!cfg.notifications.bell);
        assert_eq!(cfg.focus.kind, FocusKind::Shallow);
        assert_eq!(cfg.display.title, "zsh");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("ui.dark_mode", "true"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("pomodoro", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("notifications.bell", "loud").is_err());
        assert!(cfg.set("pomodoro.work_minutes", "abc").is_err());
        assert!(cfg.set("focus.kind", "medium").is_err());
        assert!(matches!(
            cfg.set("focus.duration_minutes", "200"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn entries_list_every_leaf() {
        let entries = Config::default().entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"display.engine_tick_ms"));
        assert!(keys.contains(&"focus.duration_minutes"));
        assert!(keys.contains(&"notifications.bell"));
        assert_eq!(entries.len(), 9);
    }

    #[test]
    fn engine_configs_are_clamped() {
        let mut cfg = Config::default();
        cfg.pomodoro.work_minutes = 5;
        cfg.focus.duration_minutes = 500;
        assert_eq!(cfg.pomodoro_config().work_duration_ms, minutes_to_ms(15));
        assert_eq!(cfg.focus_config().duration_ms, minutes_to_ms(180));
    }

    #[test]
    fn tick_intervals_are_bounded() {
        let mut display = DisplayConfig::default();
        assert_eq!(display.engine_tick(), Duration::from_millis(100));
        display.engine_tick_ms = 10;
        assert_eq!(display.engine_tick(), Duration::from_millis(100));
        display.engine_tick_ms = 5_000;
        assert_eq!(display.engine_tick(), Duration::from_millis(1000));
        assert_eq!(display.title_tick(), Duration::from_secs(1));
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("pomodoro.work_minutes", "50").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().pomodoro.work_minutes, 50);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "pomodoro = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
