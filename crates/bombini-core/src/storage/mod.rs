mod config;
pub mod database;
pub mod persistence;

pub use config::{Config, DisplayConfig, FocusSettings, NotificationsConfig, PomodoroSettings};
pub use database::{Database, NewSession, SessionRecord, Stats};
pub use persistence::{MemorySnapshotStore, Persistence, SnapshotStore, SNAPSHOT_KEY};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `BOMBINI_DATA_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/bombini[-dev]/`, with `BOMBINI_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("BOMBINI_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("BOMBINI_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("bombini-dev")
            } else {
                base_dir.join("bombini")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
