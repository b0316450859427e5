//! Timer configuration.
//!
//! Stored as JSON under [`TIMER_CONFIG_KEY`](super::TIMER_CONFIG_KEY). Reads
//! are forgiving: every field is merged individually with its default, so a
//! missing, zero, null, mistyped or out-of-range value falls back without
//! discarding the rest of the stored config.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

pub const FOCUS_RANGE: (u32, u32) = (1, 120);
pub const SHORT_BREAK_RANGE: (u32, u32) = (1, 60);
pub const LONG_BREAK_RANGE: (u32, u32) = (1, 120);
pub const LONG_BREAK_EVERY_RANGE: (u32, u32) = (2, 10);
pub const TOTAL_SESSIONS_RANGE: (u32, u32) = (1, 24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Focus phase length in minutes.
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break")]
    pub long_break_duration: u32,
    /// A long break follows every Nth focus session.
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u32,
    /// Focus sessions that make up a full day.
    #[serde(default = "default_total_sessions")]
    pub total_sessions: u32,
    #[serde(default)]
    pub auto_start_next: bool,
    #[serde(default = "default_true")]
    pub allow_pause: bool,
}

/// Partial update accepted by the engine's `update_config`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_every: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sessions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start_next: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_pause: Option<bool>,
}

fn default_focus_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_long_break_every() -> u32 {
    4
}
fn default_total_sessions() -> u32 {
    8
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            short_break_duration: default_short_break(),
            long_break_duration: default_long_break(),
            long_break_every: default_long_break_every(),
            total_sessions: default_total_sessions(),
            auto_start_next: false,
            allow_pause: true,
        }
    }
}

fn check(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

impl TimerConfig {
    /// Check every numeric field against its permitted range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check("focus_duration", self.focus_duration, FOCUS_RANGE)?;
        check("short_break_duration", self.short_break_duration, SHORT_BREAK_RANGE)?;
        check("long_break_duration", self.long_break_duration, LONG_BREAK_RANGE)?;
        check("long_break_every", self.long_break_every, LONG_BREAK_EVERY_RANGE)?;
        check("total_sessions", self.total_sessions, TOTAL_SESSIONS_RANGE)?;
        Ok(())
    }

    /// Rebuild a config from stored JSON, keeping each usable field and
    /// defaulting the rest.
    ///
    /// Returns `None` when the payload is not a JSON object at all.
    pub fn merge_stored(json: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(json).ok()?;
        let obj = value.as_object()?;
        let defaults = Self::default();

        let number = |key: &str, fallback: u32, range: (u32, u32)| -> u32 {
            obj.get(key)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n >= range.0 && *n <= range.1)
                .unwrap_or(fallback)
        };
        let flag = |key: &str, fallback: bool| -> bool {
            obj.get(key).and_then(Value::as_bool).unwrap_or(fallback)
        };

        Some(Self {
            focus_duration: number("focus_duration", defaults.focus_duration, FOCUS_RANGE),
            short_break_duration: number(
                "short_break_duration",
                defaults.short_break_duration,
                SHORT_BREAK_RANGE,
            ),
            long_break_duration: number(
                "long_break_duration",
                defaults.long_break_duration,
                LONG_BREAK_RANGE,
            ),
            long_break_every: number(
                "long_break_every",
                defaults.long_break_every,
                LONG_BREAK_EVERY_RANGE,
            ),
            total_sessions: number("total_sessions", defaults.total_sessions, TOTAL_SESSIONS_RANGE),
            auto_start_next: flag("auto_start_next", defaults.auto_start_next),
            allow_pause: flag("allow_pause", defaults.allow_pause),
        })
    }

    /// Apply `patch` on top of this config after validating the result.
    ///
    /// # Errors
    /// Returns the first out-of-range field; `self` is left untouched.
    pub fn merged(&self, patch: &TimerConfigPatch) -> Result<Self, ValidationError> {
        let next = Self {
            focus_duration: patch.focus_duration.unwrap_or(self.focus_duration),
            short_break_duration: patch
                .short_break_duration
                .unwrap_or(self.short_break_duration),
            long_break_duration: patch
                .long_break_duration
                .unwrap_or(self.long_break_duration),
            long_break_every: patch.long_break_every.unwrap_or(self.long_break_every),
            total_sessions: patch.total_sessions.unwrap_or(self.total_sessions),
            auto_start_next: patch.auto_start_next.unwrap_or(self.auto_start_next),
            allow_pause: patch.allow_pause.unwrap_or(self.allow_pause),
        };
        next.validate()?;
        Ok(next)
    }
}

impl From<TimerConfig> for TimerConfigPatch {
    /// A patch that sets every field to `config`'s value.
    fn from(config: TimerConfig) -> Self {
        Self {
            focus_duration: Some(config.focus_duration),
            short_break_duration: Some(config.short_break_duration),
            long_break_duration: Some(config.long_break_duration),
            long_break_every: Some(config.long_break_every),
            total_sessions: Some(config.total_sessions),
            auto_start_next: Some(config.auto_start_next),
            allow_pause: Some(config.allow_pause),
        }
    }
}

impl TimerConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build a single-field patch from a `key=value` pair as typed on the
    /// command line.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, String> {
        let number = || {
            value
                .parse::<u32>()
                .map_err(|_| format!("cannot parse '{value}' as a whole number"))
        };
        let flag = || {
            value
                .parse::<bool>()
                .map_err(|_| format!("cannot parse '{value}' as true/false"))
        };

        let mut patch = Self::default();
        match key {
            "focus_duration" => patch.focus_duration = Some(number()?),
            "short_break_duration" => patch.short_break_duration = Some(number()?),
            "long_break_duration" => patch.long_break_duration = Some(number()?),
            "long_break_every" => patch.long_break_every = Some(number()?),
            "total_sessions" => patch.total_sessions = Some(number()?),
            "auto_start_next" => patch.auto_start_next = Some(flag()?),
            "allow_pause" => patch.allow_pause = Some(flag()?),
            _ => return Err(format!("unknown config key: {key}")),
        }
        Ok(patch)
    }
}
