//! Typed access to the timer's persisted entries.
//!
//! Reads never fail: a missing, unreadable or corrupt entry is logged and
//! replaced by its default. Writes report errors so the caller can decide;
//! the engine logs and carries on.

use serde::Serialize;

use super::config::TimerConfig;
use super::kv::KvStore;
use super::{CURRENT_SESSION_KEY, SESSION_HISTORY_KEY, TIMER_CONFIG_KEY};
use crate::error::{CoreError, Result};
use crate::timer::TimerSession;

pub struct TimerRepository<S> {
    store: S,
}

impl<S: KvStore> TimerRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read persisted entry");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json).map_err(CoreError::from)
    }

    /// Stored config merged field-by-field with defaults.
    pub fn load_config(&self) -> TimerConfig {
        let Some(json) = self.read(TIMER_CONFIG_KEY) else {
            return TimerConfig::default();
        };
        TimerConfig::merge_stored(&json).unwrap_or_else(|| {
            tracing::warn!("stored timer config is not a JSON object, using defaults");
            TimerConfig::default()
        })
    }

    pub fn save_config(&self, config: &TimerConfig) -> Result<()> {
        self.write(TIMER_CONFIG_KEY, config)
    }

    pub fn load_current_session(&self) -> Option<TimerSession> {
        let json = self.read(CURRENT_SESSION_KEY)?;
        match serde_json::from_str(&json) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable current session");
                None
            }
        }
    }

    pub fn save_current_session(&self, session: &TimerSession) -> Result<()> {
        self.write(CURRENT_SESSION_KEY, session)
    }

    pub fn clear_current_session(&self) -> Result<()> {
        self.store.delete(CURRENT_SESSION_KEY).map_err(CoreError::from)
    }

    pub fn load_history(&self) -> Vec<TimerSession> {
        let Some(json) = self.read(SESSION_HISTORY_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&json) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session history");
                Vec::new()
            }
        }
    }

    pub fn save_history(&self, history: &[TimerSession]) -> Result<()> {
        self.write(SESSION_HISTORY_KEY, history)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.store.delete(SESSION_HISTORY_KEY).map_err(CoreError::from)
    }
}
