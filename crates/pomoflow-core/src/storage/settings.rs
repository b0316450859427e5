//! TOML-based application settings.
//!
//! Stores preferences for the collaborators around the timer:
//! - Notification preferences
//! - Audio cue theme and volume
//!
//! Settings are stored at `<data dir>/settings.toml`. Timer durations live
//! in the key-value store instead (see [`TimerConfig`](super::TimerConfig)).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
    #[serde(default)]
    pub critical_alerts: bool,
    #[serde(default)]
    pub bypass_dnd: bool,
}

/// Audio cue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// One of `soft`, `bell`, `marimba`, `woodblock`, `none`.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Cue volume, 0.0 to 1.0.
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub ambient_sound: Option<String>,
    #[serde(default = "default_ambient_volume")]
    pub ambient_volume: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub audio: AudioSettings,
}

fn default_true() -> bool {
    true
}
fn default_theme() -> String {
    "soft".into()
}
fn default_volume() -> f64 {
    0.7
}
fn default_ambient_volume() -> f64 {
    0.3
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            vibration: true,
            critical_alerts: false,
            bypass_dnd: false,
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            volume: default_volume(),
            ambient_sound: None,
            ambient_volume: default_ambient_volume(),
        }
    }
}

impl AudioSettings {
    /// Sound asset for the configured theme, `None` when muted.
    pub fn chime(&self) -> Option<&'static str> {
        match self.theme.as_str() {
            "soft" => Some("chime-soft"),
            "bell" => Some("chime-bell"),
            "marimba" => Some("chime-marimba"),
            "woodblock" => Some("chime-woodblock"),
            _ => None,
        }
    }
}

impl AppSettings {
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
        clear_strings: bool,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent) = parent {
            for part in parent.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else {
                    let n = value
                        .parse::<f64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                }
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ if clear_strings && (value.is_empty() || value == "none") => {
                serde_json::Value::Null
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("."),
            message: e.to_string(),
        })?;
        Ok(dir.join("settings.toml"))
    }

    /// Load from the default location, writing defaults if the file is
    /// missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default settings cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
        }
    }

    /// Load from disk, returning defaults on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default settings");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a settings value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// `""` or `"none"` clears an optional string; on a required string
    /// field it is stored literally.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value does not fit the
    /// key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let clearing = value.is_empty() || value == "none";
        match self.updated(key, value, clearing) {
            Err(ConfigError::InvalidValue { .. }) if clearing => {
                *self = self.updated(key, value, false)?;
            }
            result => *self = result?,
        }
        Ok(())
    }

    fn updated(&self, key: &str, value: &str, clear_strings: bool) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value, clear_strings)?;
        serde_json::from_value(json).map_err(|e| invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip() {
        let settings = AppSettings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: AppSettings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: AppSettings = toml::from_str("[audio]\ntheme = \"bell\"\n").unwrap();
        assert_eq!(parsed.audio.theme, "bell");
        assert_eq!(parsed.audio.volume, 0.7);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let settings = AppSettings::default();
        assert_eq!(settings.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(settings.get("audio.theme").as_deref(), Some("soft"));
        assert!(settings.get("audio.missing_key").is_none());
        assert!(settings.get("").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut settings = AppSettings::default();
        settings.set("notifications.vibration", "false").unwrap();
        settings.set("audio.volume", "0.25").unwrap();
        settings.set("audio.theme", "marimba").unwrap();
        assert!(!settings.notifications.vibration);
        assert_eq!(settings.audio.volume, 0.25);
        assert_eq!(settings.audio.chime(), Some("chime-marimba"));
    }

    #[test]
    fn set_integer_into_float_field() {
        let mut settings = AppSettings::default();
        settings.set("audio.volume", "1").unwrap();
        assert_eq!(settings.audio.volume, 1.0);
    }

    #[test]
    fn set_optional_string_field() {
        let mut settings = AppSettings::default();
        settings.set("audio.ambient_sound", "rain").unwrap();
        assert_eq!(settings.audio.ambient_sound.as_deref(), Some("rain"));
        settings.set("audio.ambient_sound", "none").unwrap();
        assert!(settings.audio.ambient_sound.is_none());
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut settings = AppSettings::default();
        assert!(matches!(
            settings.set("audio.nonexistent", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            settings.set("notifications.enabled", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn none_theme_mutes_chime() {
        let mut settings = AppSettings::default();
        settings.set("audio.theme", "none").unwrap();
        assert_eq!(settings.audio.theme, "none");
        assert_eq!(settings.audio.chime(), None);
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded, AppSettings::default());
        assert!(path.exists());

        let mut changed = loaded.clone();
        changed.set("audio.theme", "bell").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap().audio.theme, "bell");
    }

    #[test]
    fn load_from_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[[[not toml").unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
