//! End-to-end engine tests over an on-disk SQLite store.
//!
//! Each test works in its own temporary directory and reopens the store
//! between steps the way separate CLI invocations would.

use std::path::Path;

use chrono::{TimeZone, Utc};
use pomoflow_core::events::Event;
use pomoflow_core::stats::StatsAnalyzer;
use pomoflow_core::storage::{
    KvStore, SqliteStore, TimerConfigPatch, CURRENT_SESSION_KEY, SESSION_HISTORY_KEY,
    TIMER_CONFIG_KEY,
};
use pomoflow_core::timer::{
    Clock, Collaborators, LifecycleState, ManualClock, Phase, TimerEngine,
};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap())
}

fn open(path: &Path, clock: &ManualClock) -> TimerEngine<SqliteStore, ManualClock> {
    let store = SqliteStore::open_at(path).unwrap();
    TimerEngine::load_with(store, clock.clone(), Collaborators::default())
}

/// Tick once per simulated second until something happens or `max` ticks.
fn run_until_event(
    engine: &mut TimerEngine<SqliteStore, ManualClock>,
    clock: &ManualClock,
    max: u64,
) -> Option<Event> {
    for _ in 0..max {
        clock.advance_secs(1);
        if let Some(event) = engine.on_tick() {
            return Some(event);
        }
    }
    None
}

// ============================================================================
// Full day
// ============================================================================

#[test]
fn short_day_runs_to_goal_and_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pomoflow.db");
    let clock = clock();

    {
        let mut engine = open(&db, &clock);
        engine
            .update_config(&TimerConfigPatch {
                focus_duration: Some(1),
                short_break_duration: Some(1),
                long_break_duration: Some(2),
                long_break_every: Some(2),
                total_sessions: Some(2),
                ..TimerConfigPatch::default()
            })
            .unwrap();

        engine.start();
        let first = run_until_event(&mut engine, &clock, 120).unwrap();
        assert!(matches!(
            first,
            Event::TimerCompleted {
                session_count: 1,
                daily_goal_reached: false,
                auto_start_in_ms: None,
                ..
            }
        ));

        assert!(matches!(
            engine.start(),
            Some(Event::TimerStarted {
                phase: Phase::ShortBreak,
                duration_secs: 60,
                ..
            })
        ));
        run_until_event(&mut engine, &clock, 120).unwrap();
        assert_eq!(engine.session_count(), 1);

        engine.start();
        assert_eq!(engine.phase(), Phase::Focus);
        let last = run_until_event(&mut engine, &clock, 120).unwrap();
        assert!(matches!(
            last,
            Event::TimerCompleted {
                session_count: 2,
                daily_goal_reached: true,
                ..
            }
        ));
        assert_eq!(engine.state(), LifecycleState::Completed);

        // The day is done, but the pending long break can still be taken.
        assert!(matches!(
            engine.start(),
            Some(Event::TimerStarted {
                phase: Phase::LongBreak,
                duration_secs: 120,
                ..
            })
        ));
        engine.reset();
    }

    // The discarded long break is offered again after reopening.
    let engine = open(&db, &clock);
    assert_eq!(engine.state(), LifecycleState::Idle);
    assert_eq!(engine.phase(), Phase::LongBreak);
    assert_eq!(engine.session_count(), 2);
    assert_eq!(engine.history().len(), 3);
    assert_eq!(engine.config().focus_duration, 1);
    assert_eq!(engine.time_remaining(), 120);
    assert!(engine.current_session().is_none());

    let stats = StatsAnalyzer::new(engine.history()).summary(clock.now().date_naive());
    assert_eq!(stats.completed_sessions, 3);
    assert_eq!(stats.streak, 1);
    assert!((stats.total_focus_minutes - 2.0).abs() < 1e-9);
}

// ============================================================================
// Restore
// ============================================================================

#[test]
fn open_session_is_restored_paused_with_wall_clock_remaining() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pomoflow.db");
    let clock = clock();

    let session_id = {
        let mut engine = open(&db, &clock);
        engine.start();
        run_until_event(&mut engine, &clock, 100);
        assert_eq!(engine.time_remaining(), 1400);
        engine.current_session().unwrap().id.clone()
    };

    // Time keeps passing while nothing is running.
    clock.advance_secs(200);

    let mut engine = open(&db, &clock);
    assert_eq!(engine.state(), LifecycleState::Paused);
    assert_eq!(engine.time_remaining(), 1200);
    assert_eq!(engine.current_session().unwrap().id, session_id);

    assert!(matches!(
        engine.resume(),
        Some(Event::TimerResumed {
            remaining_secs: 1200,
            ..
        })
    ));
    run_until_event(&mut engine, &clock, 10);
    assert_eq!(engine.time_remaining(), 1190);
}

#[test]
fn skip_after_reopen_records_elapsed_minutes() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pomoflow.db");
    let clock = clock();

    {
        let mut engine = open(&db, &clock);
        engine.start();
    }
    clock.advance_secs(600);

    let mut engine = open(&db, &clock);
    let Some(Event::TimerSkipped { session, to, .. }) = engine.skip() else {
        panic!("expected a skip event");
    };
    let session = session.unwrap();
    assert!(session.interrupted);
    assert!((session.actual_duration - 10.0).abs() < 1e-9);
    assert_eq!(to, Phase::ShortBreak);
    assert_eq!(engine.session_count(), 1);

    let store = SqliteStore::open_at(&db).unwrap();
    assert_eq!(store.get(CURRENT_SESSION_KEY).unwrap(), None);
}

#[test]
fn phase_carries_over_between_reopens() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pomoflow.db");
    let clock = clock();

    {
        let mut engine = open(&db, &clock);
        engine.start();
        assert!(matches!(
            engine.skip(),
            Some(Event::TimerSkipped {
                to: Phase::ShortBreak,
                ..
            })
        ));
    }

    let mut engine = open(&db, &clock);
    assert_eq!(engine.state(), LifecycleState::Idle);
    assert_eq!(engine.phase(), Phase::ShortBreak);
    assert_eq!(engine.time_remaining(), 300);
    assert!(matches!(
        engine.start(),
        Some(Event::TimerStarted {
            phase: Phase::ShortBreak,
            ..
        })
    ));
    let completed = run_until_event(&mut engine, &clock, 400);
    assert!(matches!(completed, Some(Event::TimerCompleted { .. })));
    drop(engine);

    let engine = open(&db, &clock);
    assert_eq!(engine.phase(), Phase::Focus);
    assert_eq!(engine.time_remaining(), 1500);
    assert_eq!(engine.session_count(), 1);
}

// ============================================================================
// Damaged storage
// ============================================================================

#[test]
fn damaged_entries_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pomoflow.db");
    {
        let store = SqliteStore::open_at(&db).unwrap();
        store
            .set(
                TIMER_CONFIG_KEY,
                r#"{"focus_duration":0,"short_break_duration":"x","long_break_duration":20}"#,
            )
            .unwrap();
        store.set(SESSION_HISTORY_KEY, "not json").unwrap();
        store.set(CURRENT_SESSION_KEY, "{").unwrap();
    }

    let engine = open(&db, &clock());
    assert_eq!(engine.config().focus_duration, 25);
    assert_eq!(engine.config().short_break_duration, 5);
    assert_eq!(engine.config().long_break_duration, 20);
    assert!(engine.history().is_empty());
    assert_eq!(engine.state(), LifecycleState::Idle);
    assert_eq!(engine.time_remaining(), 1500);
}
