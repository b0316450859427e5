//! Timer engine implementation.
//!
//! The engine is a second-granularity state machine. It does not use
//! internal threads: the caller drives it by calling [`TimerEngine::on_tick`]
//! once per second while it is running (see [`crate::runtime`] for the async
//! driver). Every command persists what it changed before returning.
//!
//! ## State Transitions
//!
//! ```text
//! Idle/Completed --start--> Running --pause--> Paused --resume--> Running
//! Running --tick to zero--> Completed
//! any --reset--> Idle
//! any --skip--> Idle | Completed
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::load(MemoryStore::new());
//! engine.start();
//! // Once per second:
//! engine.on_tick(); // Returns Some(Event::TimerCompleted { .. }) at zero
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::phase::{duration_for, duration_secs_for, next_phase, Phase};
use super::session::{close_session, create_session, reconcile, TimerSession};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::format::calculate_progress;
use crate::notify::{AudioPlayer, LogAudioPlayer, LogNotifier, NotificationScheduler};
use crate::storage::{AppSettings, KvStore, TimerConfig, TimerConfigPatch, TimerRepository};

/// Pause between a natural completion and the automatic start of the next
/// phase when `auto_start_next` is on.
pub const AUTO_START_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Idle,
    Running,
    Paused,
    Completed,
}

impl LifecycleState {
    /// `true` while a session is open.
    pub fn has_session(self) -> bool {
        matches!(self, LifecycleState::Running | LifecycleState::Paused)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Running => "running",
            LifecycleState::Paused => "paused",
            LifecycleState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Notification and audio backends handed to the engine.
pub struct Collaborators {
    pub notifier: Box<dyn NotificationScheduler>,
    pub audio: Box<dyn AudioPlayer>,
}

impl Collaborators {
    pub fn new(
        notifier: impl NotificationScheduler + 'static,
        audio: impl AudioPlayer + 'static,
    ) -> Self {
        Self {
            notifier: Box::new(notifier),
            audio: Box::new(audio),
        }
    }

    /// Logging stubs configured from the user's settings.
    pub fn logging(settings: &AppSettings) -> Self {
        Self::new(LogNotifier::new(settings), LogAudioPlayer::new(settings))
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::new(LogNotifier::default(), LogAudioPlayer::default())
    }
}

/// Core timer engine.
///
/// Owns the phase, lifecycle state, countdown and session history. The only
/// way to change any of it is through the command methods below.
pub struct TimerEngine<S, C = SystemClock> {
    repo: TimerRepository<S>,
    clock: C,
    collaborators: Collaborators,
    config: TimerConfig,
    phase: Phase,
    state: LifecycleState,
    /// Seconds left in the current phase.
    time_remaining: u64,
    /// Focus sessions closed since the last daily reset.
    session_count: u32,
    current_session: Option<TimerSession>,
    history: Vec<TimerSession>,
    /// Phase to move to once a naturally completed phase is left.
    pending_phase: Option<Phase>,
    /// Bumped every time the engine enters `Running`; ticks stamped with an
    /// older epoch come from a cancelled tick source.
    tick_epoch: u64,
}

impl<S: KvStore> TimerEngine<S, SystemClock> {
    /// Restore an engine from `store` using the system clock and logging
    /// collaborators.
    pub fn load(store: S) -> Self {
        Self::load_with(store, SystemClock, Collaborators::default())
    }
}

impl<S: KvStore, C: Clock> TimerEngine<S, C> {
    /// Restore an engine from `store`.
    ///
    /// An unfinished persisted session comes back `Paused` with its
    /// remaining time recomputed from the wall clock; the engine never
    /// resumes counting on its own. Otherwise it waits idle at the phase
    /// that follows the last recorded session. The focus session count is
    /// always derived from history.
    pub fn load_with(store: S, clock: C, collaborators: Collaborators) -> Self {
        let repo = TimerRepository::new(store);
        let config = repo.load_config();
        let history = repo.load_history();
        let session_count = count_focus_sessions(&history);
        let phase = phase_after(&history, &config);

        let mut engine = Self {
            repo,
            clock,
            collaborators,
            config,
            phase,
            state: LifecycleState::Idle,
            time_remaining: duration_secs_for(phase, &config),
            session_count,
            current_session: None,
            history,
            pending_phase: None,
            tick_epoch: 0,
        };

        match engine.repo.load_current_session() {
            Some(session) if !session.completed => {
                let restored = reconcile(&session, engine.clock.now());
                tracing::debug!(
                    session_id = %session.id,
                    phase = %session.phase,
                    time_remaining = restored.time_remaining,
                    expired = restored.is_expired,
                    "restored in-flight session as paused"
                );
                engine.phase = session.phase;
                engine.state = LifecycleState::Paused;
                engine.time_remaining = restored.time_remaining;
                engine.current_session = Some(session);
            }
            Some(stale) => {
                tracing::debug!(session_id = %stale.id, "dropping already-closed current session");
                let cleared = engine.repo.clear_current_session();
                engine.persisted("clear current session", cleared);
            }
            None => {}
        }

        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time_remaining(&self) -> u64 {
        self.time_remaining
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn total_sessions(&self) -> u32 {
        self.config.total_sessions
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn current_session(&self) -> Option<&TimerSession> {
        self.current_session.as_ref()
    }

    pub fn history(&self) -> &[TimerSession] {
        &self.history
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn tick_epoch(&self) -> u64 {
        self.tick_epoch
    }

    pub fn store(&self) -> &S {
        self.repo.store()
    }

    /// Full length of the current phase in seconds. An open session keeps
    /// the length it was started with even if the config changed since.
    pub fn phase_duration_secs(&self) -> u64 {
        match &self.current_session {
            Some(session) => session.planned_secs(),
            None => duration_secs_for(self.phase, &self.config),
        }
    }

    /// 0.0 .. 100.0 progress within the current phase.
    pub fn progress_pct(&self) -> f64 {
        calculate_progress(self.time_remaining, self.phase_duration_secs())
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            phase: self.phase,
            remaining_secs: self.time_remaining,
            total_secs: self.phase_duration_secs(),
            progress_pct: self.progress_pct(),
            session_count: self.session_count,
            total_sessions: self.config.total_sessions,
            current_session_id: self.current_session.as_ref().map(|s| s.id.clone()),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a new session, or continue a paused one.
    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            LifecycleState::Idle | LifecycleState::Completed => {
                if self.state == LifecycleState::Completed {
                    if let Some(next) = self.pending_phase.take() {
                        self.phase = next;
                    }
                }
                let now = self.clock.now();
                let minutes = duration_for(self.phase, &self.config);
                let session = create_session(self.phase, minutes, now);
                let saved = self.repo.save_current_session(&session);
                self.persisted("save current session", saved);

                self.time_remaining = session.planned_secs();
                self.state = LifecycleState::Running;
                self.pending_phase = None;
                self.enter_running();

                tracing::debug!(session_id = %session.id, phase = %self.phase, "session started");
                let event = Event::TimerStarted {
                    phase: self.phase,
                    session_id: session.id.clone(),
                    duration_secs: self.time_remaining,
                    at: now,
                };
                self.current_session = Some(session);
                Some(event)
            }
            LifecycleState::Paused => self.resume(),
            LifecycleState::Running => None,
        }
    }

    /// Stop counting, keeping the session open. A no-op unless running and
    /// pausing is allowed.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state != LifecycleState::Running || !self.config.allow_pause {
            return None;
        }
        self.state = LifecycleState::Paused;
        self.collaborators.notifier.cancel_all();
        tracing::debug!(remaining = self.time_remaining, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.time_remaining,
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != LifecycleState::Paused {
            return None;
        }
        self.state = LifecycleState::Running;
        self.enter_running();
        tracing::debug!(remaining = self.time_remaining, "timer resumed");
        Some(Event::TimerResumed {
            remaining_secs: self.time_remaining,
            at: self.clock.now(),
        })
    }

    /// Drop the open session without recording it and rewind the current
    /// phase. A no-op when already idle.
    pub fn reset(&mut self) -> Option<Event> {
        if self.state == LifecycleState::Idle && self.current_session.is_none() {
            return None;
        }
        self.state = LifecycleState::Idle;
        self.current_session = None;
        self.pending_phase = None;
        self.time_remaining = duration_secs_for(self.phase, &self.config);
        self.collaborators.notifier.cancel_all();
        let cleared = self.repo.clear_current_session();
        self.persisted("clear current session", cleared);

        tracing::debug!(phase = %self.phase, "timer reset");
        Some(Event::TimerReset {
            phase: self.phase,
            at: self.clock.now(),
        })
    }

    /// Abandon the current phase and move on.
    ///
    /// An open session is closed as interrupted and recorded. If that was
    /// the focus session meeting the day's target the engine stops in
    /// `Completed`; otherwise it waits in `Idle` at the next phase.
    pub fn skip(&mut self) -> Option<Event> {
        let now = self.clock.now();
        let from = self.phase;
        let count_before = self.session_count;

        let closed = self
            .current_session
            .take()
            .map(|session| close_session(&session, true, self.time_remaining, now));

        let mut goal_reached = false;
        if let Some(session) = &closed {
            if session.is_focus() {
                self.session_count = self.session_count.saturating_add(1);
                goal_reached = self.session_count >= self.config.total_sessions;
            }
            self.append_history(session.clone());
        }

        let next = self
            .pending_phase
            .take()
            .unwrap_or_else(|| next_phase(from, count_before, &self.config));

        if goal_reached {
            self.state = LifecycleState::Completed;
            self.pending_phase = Some(next);
        } else {
            self.phase = next;
            self.state = LifecycleState::Idle;
            self.time_remaining = duration_secs_for(next, &self.config);
        }

        self.collaborators.notifier.cancel_all();
        let cleared = self.repo.clear_current_session();
        self.persisted("clear current session", cleared);

        tracing::debug!(%from, to = %self.phase, state = %self.state, "phase skipped");
        Some(Event::TimerSkipped {
            from,
            to: self.phase,
            session: closed,
            state: self.state,
            at: now,
        })
    }

    /// Advance the countdown by one second. Returns the completion event
    /// when the phase runs out.
    pub fn on_tick(&mut self) -> Option<Event> {
        if self.state != LifecycleState::Running {
            return None;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            return self.complete();
        }
        None
    }

    /// [`on_tick`](Self::on_tick) for a tick source stamped with `epoch`.
    /// Ticks from a source that has since been replaced are ignored.
    pub fn on_tick_from(&mut self, epoch: u64) -> Option<Event> {
        if epoch != self.tick_epoch {
            tracing::trace!(epoch, current = self.tick_epoch, "ignoring stale tick");
            return None;
        }
        self.on_tick()
    }

    /// Deferred continuation scheduled by a completion with
    /// `auto_start_next` on: move to the next phase and start it.
    ///
    /// It acts on whatever state exists when it fires. If the user reset or
    /// skipped in between, the engine advances again from wherever it now
    /// is. It does nothing while a session is open or once the daily focus
    /// target is met.
    pub fn run_auto_start(&mut self) -> Option<Event> {
        if self.state.has_session() {
            tracing::debug!(state = %self.state, "auto-start skipped, session already open");
            return None;
        }

        let from = self.phase;
        let to = match self.pending_phase.take() {
            Some(pending) => pending,
            None => {
                // A reset dropped the pending phase; the focus session that
                // just closed is already in the count.
                let closed_before = if from == Phase::Focus {
                    self.session_count.saturating_sub(1)
                } else {
                    self.session_count
                };
                next_phase(from, closed_before, &self.config)
            }
        };

        if to == Phase::Focus && self.session_count >= self.config.total_sessions {
            tracing::debug!(session_count = self.session_count, "auto-start skipped, daily target met");
            self.pending_phase = Some(to);
            return None;
        }

        self.phase = to;
        // Start from Idle so the new phase is used as-is.
        self.state = LifecycleState::Idle;
        self.start()?;

        Some(Event::PhaseAdvanced {
            from,
            to,
            duration_secs: self.time_remaining,
            at: self.clock.now(),
        })
    }

    /// Merge `patch` into the config and persist it.
    ///
    /// While idle or completed the countdown is rewound to the (possibly
    /// new) length of the current phase; an open session keeps its time.
    ///
    /// # Errors
    /// Rejects the whole patch if any field is out of range.
    pub fn update_config(&mut self, patch: &TimerConfigPatch) -> Result<Event, ValidationError> {
        let updated = self.config.merged(patch)?;
        self.config = updated;
        let saved = self.repo.save_config(&self.config);
        self.persisted("save timer config", saved);

        if matches!(self.state, LifecycleState::Idle | LifecycleState::Completed) {
            self.time_remaining = duration_secs_for(self.phase, &self.config);
        }

        tracing::debug!(?patch, "timer config updated");
        Ok(Event::ConfigUpdated {
            config: self.config,
            at: self.clock.now(),
        })
    }

    /// Start a new day: back to an idle focus phase with no history.
    pub fn reset_daily_progress(&mut self) -> Event {
        self.phase = Phase::Focus;
        self.state = LifecycleState::Idle;
        self.session_count = 0;
        self.current_session = None;
        self.pending_phase = None;
        self.history.clear();
        self.time_remaining = duration_secs_for(Phase::Focus, &self.config);
        self.collaborators.notifier.cancel_all();

        let cleared = self.repo.clear_current_session();
        self.persisted("clear current session", cleared);
        let cleared = self.repo.clear_history();
        self.persisted("clear session history", cleared);

        tracing::info!("daily progress reset");
        Event::DailyProgressReset {
            at: self.clock.now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Option<Event> {
        let now = self.clock.now();
        self.state = LifecycleState::Completed;
        let open = self.current_session.take()?;
        let session = close_session(&open, false, 0, now);

        let count_before = self.session_count;
        if session.is_focus() {
            self.session_count = self.session_count.saturating_add(1);
        }
        self.pending_phase = Some(next_phase(self.phase, count_before, &self.config));
        self.append_history(session.clone());
        let cleared = self.repo.clear_current_session();
        self.persisted("clear current session", cleared);

        self.collaborators
            .audio
            .play(self.phase.completion_sound());

        let daily_goal_reached =
            session.is_focus() && self.session_count >= self.config.total_sessions;
        let auto_start_in_ms = (self.config.auto_start_next && !daily_goal_reached)
            .then(|| AUTO_START_DELAY.as_millis() as u64);

        tracing::info!(
            session_id = %session.id,
            phase = %session.phase,
            session_count = self.session_count,
            daily_goal_reached,
            "session completed"
        );
        Some(Event::TimerCompleted {
            session,
            session_count: self.session_count,
            daily_goal_reached,
            auto_start_in_ms,
            at: now,
        })
    }

    fn enter_running(&mut self) {
        self.tick_epoch = self.tick_epoch.wrapping_add(1);
        let (title, body) = match self.phase {
            Phase::Focus => ("Focus complete", "Time for a break."),
            Phase::ShortBreak | Phase::LongBreak => ("Break over", "Time to focus."),
        };
        self.collaborators
            .notifier
            .schedule(title, body, self.time_remaining);
    }

    fn append_history(&mut self, session: TimerSession) {
        self.history.push(session);
        let saved = self.repo.save_history(&self.history);
        self.persisted("save session history", saved);
    }

    fn persisted(&self, what: &str, result: Result<()>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to {what}");
        }
    }
}

/// Phase that follows the last recorded session; focus for an empty day.
fn phase_after(history: &[TimerSession], config: &TimerConfig) -> Phase {
    let Some(last) = history.last() else {
        return Phase::Focus;
    };
    let closed = count_focus_sessions(history);
    let closed_before_last = if last.is_focus() {
        closed.saturating_sub(1)
    } else {
        closed
    };
    next_phase(last.phase, closed_before_last, config)
}

/// Focus sessions recorded in `history`, interrupted or not.
pub fn count_focus_sessions(history: &[TimerSession]) -> u32 {
    let n = history
        .iter()
        .filter(|s| s.completed && s.is_focus())
        .count();
    u32::try_from(n).unwrap_or(u32::MAX)
}
