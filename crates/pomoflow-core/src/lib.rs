//! # Pomoflow Core Library
//!
//! Core logic for the Pomoflow Pomodoro timer. Everything a front end needs
//! lives here; the CLI binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a second-granularity state machine over focus and
//!   break phases. The caller drives it with one tick per second.
//! - **Runtime**: an async service that owns the engine and does the ticking.
//! - **Storage**: a key-value store (SQLite or in-memory) holding the timer
//!   config, the in-flight session and the session history, plus TOML
//!   application settings.
//! - **Stats**: aggregates derived from session history.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`TimerService`]: tokio tick driver around the engine
//! - [`KvStore`]: persistence seam, implemented by [`SqliteStore`] and [`MemoryStore`]
//! - [`TimerConfig`]: user-adjustable durations and cycle settings

pub mod error;
pub mod events;
pub mod format;
pub mod notify;
pub mod runtime;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use runtime::TimerService;
pub use stats::{DailyStats, SessionStats, StatsAnalyzer, WeeklyStats};
pub use storage::{
    AppSettings, KvStore, MemoryStore, SqliteStore, TimerConfig, TimerConfigPatch, TimerRepository,
};
pub use timer::{Collaborators, LifecycleState, Phase, TimerEngine, TimerSession};
