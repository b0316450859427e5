use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::timer::TimerSession;

/// Aggregate over a whole history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Minutes actually spent in focus, including interrupted sessions.
    pub total_focus_minutes: f64,
    pub total_break_minutes: f64,
    /// Sessions that ran to zero.
    pub completed_sessions: u32,
    /// Every recorded session, interrupted or not.
    pub total_sessions: u32,
    /// `completed_sessions / total_sessions`, 0.0 when empty.
    pub completion_rate: f64,
    /// Consecutive days with at least one focus session, ending today or
    /// yesterday.
    pub streak: u32,
    pub last_session_date: Option<NaiveDate>,
    pub weekly: Vec<WeeklyStats>,
}

/// Focus activity within one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    /// ISO week label, e.g. `2024-W10`.
    pub week: String,
    pub focus_minutes: f64,
    pub sessions: u32,
    pub completion_rate: f64,
}

/// Focus activity for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub focus_minutes: f64,
    pub focus_sessions: u32,
    pub completed_focus_sessions: u32,
    pub break_minutes: f64,
    pub completion_rate: f64,
}

/// Computes statistics from session history. Days are UTC calendar days.
pub struct StatsAnalyzer<'a> {
    history: &'a [TimerSession],
}

fn rate(done: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(done) / f64::from(total)
    }
}

fn session_date(session: &TimerSession) -> NaiveDate {
    session.start_time.date_naive()
}

fn finished(session: &TimerSession) -> bool {
    session.completed && !session.interrupted
}

impl<'a> StatsAnalyzer<'a> {
    pub fn new(history: &'a [TimerSession]) -> Self {
        Self { history }
    }

    /// Whole-history summary as seen on `today`.
    pub fn summary(&self, today: NaiveDate) -> SessionStats {
        let mut stats = SessionStats::default();
        for session in self.history {
            stats.total_sessions += 1;
            if finished(session) {
                stats.completed_sessions += 1;
            }
            if session.is_focus() {
                stats.total_focus_minutes += session.actual_duration;
            } else {
                stats.total_break_minutes += session.actual_duration;
            }
        }
        stats.completion_rate = rate(stats.completed_sessions, stats.total_sessions);
        stats.streak = self.streak(today);
        stats.last_session_date = self.history.iter().map(session_date).max();
        stats.weekly = self.weekly();
        stats
    }

    /// Focus activity on `date`.
    pub fn day(&self, date: NaiveDate) -> DailyStats {
        let mut day = DailyStats {
            date,
            focus_minutes: 0.0,
            focus_sessions: 0,
            completed_focus_sessions: 0,
            break_minutes: 0.0,
            completion_rate: 0.0,
        };
        for session in self.history.iter().filter(|s| session_date(s) == date) {
            if session.is_focus() {
                day.focus_sessions += 1;
                day.focus_minutes += session.actual_duration;
                if finished(session) {
                    day.completed_focus_sessions += 1;
                }
            } else {
                day.break_minutes += session.actual_duration;
            }
        }
        day.completion_rate = rate(day.completed_focus_sessions, day.focus_sessions);
        day
    }

    /// Consecutive focus days ending at `today`, or at yesterday when
    /// nothing has been done yet today.
    pub fn streak(&self, today: NaiveDate) -> u32 {
        let days: BTreeSet<NaiveDate> = self
            .history
            .iter()
            .filter(|s| s.is_focus())
            .map(session_date)
            .collect();

        let mut cursor = if days.contains(&today) {
            today
        } else {
            today - Duration::days(1)
        };
        let mut streak = 0;
        while days.contains(&cursor) {
            streak += 1;
            cursor -= Duration::days(1);
        }
        streak
    }

    /// Per-ISO-week focus summaries, oldest first.
    pub fn weekly(&self) -> Vec<WeeklyStats> {
        let mut weeks: BTreeMap<(i32, u32), (f64, u32, u32)> = BTreeMap::new();
        for session in self.history.iter().filter(|s| s.is_focus()) {
            let iso = session_date(session).iso_week();
            let entry = weeks.entry((iso.year(), iso.week())).or_default();
            entry.0 += session.actual_duration;
            entry.1 += 1;
            if finished(session) {
                entry.2 += 1;
            }
        }
        weeks
            .into_iter()
            .map(|((year, week), (minutes, sessions, done))| WeeklyStats {
                week: format!("{year}-W{week:02}"),
                focus_minutes: minutes,
                sessions,
                completion_rate: rate(done, sessions),
            })
            .collect()
    }
}
