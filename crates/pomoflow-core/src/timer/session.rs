//! Session records.
//!
//! A [`TimerSession`] is opened when a phase starts running and closed
//! exactly once, either by the countdown reaching zero or by a skip. Closed
//! sessions are appended to history and never modified again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phase::Phase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSession {
    pub id: String,
    pub phase: Phase,
    /// Planned length in minutes.
    pub planned_duration: u32,
    /// Minutes actually spent; zero until the session is closed.
    #[serde(default)]
    pub actual_duration: f64,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub interrupted: bool,
}

/// Result of checking a persisted session against the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub time_remaining: u64,
    pub is_expired: bool,
}

impl TimerSession {
    pub fn planned_secs(&self) -> u64 {
        u64::from(self.planned_duration).saturating_mul(60)
    }

    pub fn is_focus(&self) -> bool {
        self.phase == Phase::Focus
    }

    /// Whole seconds between `start_time` and `now`, never negative.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        let secs = (now - self.start_time).num_seconds();
        u64::try_from(secs).unwrap_or(0)
    }
}

/// Open a fresh session for `phase` lasting `duration_minutes`.
pub fn create_session(phase: Phase, duration_minutes: u32, now: DateTime<Utc>) -> TimerSession {
    TimerSession {
        id: Uuid::new_v4().to_string(),
        phase,
        planned_duration: duration_minutes,
        actual_duration: 0.0,
        start_time: now,
        end_time: None,
        completed: false,
        interrupted: false,
    }
}

/// Close `session`, returning the finished record.
///
/// An interrupted session records the minutes elapsed so far
/// (`planned - time_remaining / 60`); a natural completion records the full
/// planned duration.
pub fn close_session(
    session: &TimerSession,
    interrupted: bool,
    time_remaining_secs: u64,
    now: DateTime<Utc>,
) -> TimerSession {
    let actual_duration = if interrupted {
        let planned = f64::from(session.planned_duration);
        (planned - time_remaining_secs as f64 / 60.0).clamp(0.0, planned)
    } else {
        f64::from(session.planned_duration)
    };

    TimerSession {
        end_time: Some(now),
        completed: true,
        interrupted,
        actual_duration,
        ..session.clone()
    }
}

/// Recompute how much of `session` is left at `now`.
pub fn reconcile(session: &TimerSession, now: DateTime<Utc>) -> Reconciliation {
    let time_remaining = session
        .planned_secs()
        .saturating_sub(session.elapsed_secs(now));
    Reconciliation {
        time_remaining,
        is_expired: time_remaining == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_session_is_open() {
        let now = Utc::now();
        let s = create_session(Phase::Focus, 25, now);
        assert_eq!(s.planned_duration, 25);
        assert_eq!(s.actual_duration, 0.0);
        assert_eq!(s.start_time, now);
        assert!(s.end_time.is_none());
        assert!(!s.completed);
        assert!(!s.interrupted);
    }

    #[test]
    fn ids_are_unique() {
        let now = Utc::now();
        let a = create_session(Phase::Focus, 25, now);
        let b = create_session(Phase::Focus, 25, now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn natural_close_records_planned_minutes() {
        let start = Utc::now();
        let s = create_session(Phase::ShortBreak, 5, start);
        let end = start + Duration::minutes(5);
        let closed = close_session(&s, false, 0, end);
        assert!(closed.completed);
        assert!(!closed.interrupted);
        assert_eq!(closed.actual_duration, 5.0);
        assert_eq!(closed.end_time, Some(end));
        assert_eq!(closed.id, s.id);
    }

    #[test]
    fn interrupted_close_records_elapsed_minutes() {
        let start = Utc::now();
        let s = create_session(Phase::Focus, 25, start);
        // 600s in, 900s left.
        let closed = close_session(&s, true, 900, start + Duration::seconds(600));
        assert!(closed.interrupted);
        assert!(closed.completed);
        assert!((closed.actual_duration - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reconcile_counts_down_from_start() {
        let start = Utc::now();
        let s = create_session(Phase::Focus, 25, start);
        let r = reconcile(&s, start + Duration::seconds(61));
        assert_eq!(r.time_remaining, 1500 - 61);
        assert!(!r.is_expired);
    }

    #[test]
    fn reconcile_floors_at_zero() {
        let start = Utc::now();
        let s = create_session(Phase::ShortBreak, 5, start);
        let r = reconcile(&s, start + Duration::hours(2));
        assert_eq!(r.time_remaining, 0);
        assert!(r.is_expired);
    }

    #[test]
    fn reconcile_ignores_clock_skew_into_the_past() {
        let start = Utc::now();
        let s = create_session(Phase::Focus, 25, start);
        let r = reconcile(&s, start - Duration::seconds(30));
        assert_eq!(r.time_remaining, 1500);
    }

    #[test]
    fn session_json_roundtrip_preserves_timestamps() {
        let start = Utc::now();
        let s = create_session(Phase::LongBreak, 15, start);
        let closed = close_session(&s, false, 0, start + Duration::minutes(15));
        let json = serde_json::to_string(&closed).unwrap();
        let parsed: TimerSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, closed);
    }
}
