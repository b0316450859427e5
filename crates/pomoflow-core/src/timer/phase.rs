//! Phase sequencing.
//!
//! Pure functions deciding which phase follows the current one. The
//! long-break decision always looks at the session count *after* the
//! finishing focus session has been counted.

use serde::{Deserialize, Serialize};

use crate::storage::TimerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Focus)
    }

    /// Human-readable name for display surfaces.
    pub fn display_name(self) -> &'static str {
        match self {
            Phase::Focus => "Focus Time",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    /// Sound cue played when this phase runs out.
    pub fn completion_sound(self) -> &'static str {
        match self {
            Phase::Focus => "focus-complete",
            Phase::ShortBreak | Phase::LongBreak => "break-complete",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Focus => "focus",
            Phase::ShortBreak => "short_break",
            Phase::LongBreak => "long_break",
        };
        f.write_str(s)
    }
}

/// `true` when `completed_sessions` lands on a long-break boundary.
pub fn should_take_long_break(completed_sessions: u32, long_break_every: u32) -> bool {
    long_break_every > 0 && completed_sessions > 0 && completed_sessions % long_break_every == 0
}

/// Phase following `current`, given the focus sessions closed *before* the
/// current one finishes.
pub fn next_phase(current: Phase, session_count: u32, config: &TimerConfig) -> Phase {
    match current {
        Phase::Focus => {
            if should_take_long_break(session_count.saturating_add(1), config.long_break_every) {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        }
        Phase::ShortBreak | Phase::LongBreak => Phase::Focus,
    }
}

/// Configured length of `phase` in minutes.
pub fn duration_for(phase: Phase, config: &TimerConfig) -> u32 {
    match phase {
        Phase::Focus => config.focus_duration,
        Phase::ShortBreak => config.short_break_duration,
        Phase::LongBreak => config.long_break_duration,
    }
}

/// Configured length of `phase` in seconds.
pub fn duration_secs_for(phase: Phase, config: &TimerConfig) -> u64 {
    u64::from(duration_for(phase, config)).saturating_mul(60)
}
