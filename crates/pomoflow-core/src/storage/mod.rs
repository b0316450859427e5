mod config;
pub mod kv;
pub mod repository;
pub mod settings;

pub use config::{TimerConfig, TimerConfigPatch};
pub use kv::{KvStore, MemoryStore, SqliteStore};
pub use repository::TimerRepository;
pub use settings::{AppSettings, AudioSettings, NotificationSettings};

use std::path::PathBuf;

use crate::error::StorageError;

/// Key holding the JSON-encoded [`TimerConfig`].
pub const TIMER_CONFIG_KEY: &str = "timer_config";
/// Key holding the in-flight session, absent when nothing is running.
pub const CURRENT_SESSION_KEY: &str = "current_session";
/// Key holding the ordered list of closed sessions.
pub const SESSION_HISTORY_KEY: &str = "session_history";

/// Returns the Pomoflow data directory, creating it if needed.
///
/// `POMOFLOW_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/pomoflow/`, or `~/.config/pomoflow-dev/` when
/// `POMOFLOW_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("POMOFLOW_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOFLOW_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomoflow-dev")
            } else {
                base_dir.join("pomoflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
