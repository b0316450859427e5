use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::TimerConfig;
use crate::timer::{LifecycleState, Phase, TimerSession};

/// Every state change in the engine produces an Event.
/// The presentation layer renders them; the tick driver reacts to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        session_id: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero and the session was closed.
    TimerCompleted {
        session: TimerSession,
        session_count: u32,
        /// The day's focus target has been met.
        daily_goal_reached: bool,
        /// A deferred auto-start is due after this many milliseconds.
        auto_start_in_ms: Option<u64>,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Phase,
        to: Phase,
        /// The interrupted session, if one was in flight.
        session: Option<TimerSession>,
        state: LifecycleState,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        at: DateTime<Utc>,
    },
    /// The deferred continuation after a completion moved to the next phase.
    PhaseAdvanced {
        from: Phase,
        to: Phase,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    DailyProgressReset {
        at: DateTime<Utc>,
    },
    ConfigUpdated {
        config: TimerConfig,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: LifecycleState,
        phase: Phase,
        remaining_secs: u64,
        total_secs: u64,
        progress_pct: f64,
        session_count: u32,
        total_sessions: u32,
        current_session_id: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::TimerCompleted { at, .. }
            | Event::TimerSkipped { at, .. }
            | Event::TimerReset { at, .. }
            | Event::PhaseAdvanced { at, .. }
            | Event::DailyProgressReset { at }
            | Event::ConfigUpdated { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}
