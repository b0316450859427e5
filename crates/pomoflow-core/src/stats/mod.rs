//! Statistics over recorded session history.
//!
//! All aggregates are derived on demand from the closed sessions the engine
//! keeps; nothing here is persisted separately.

mod summary;

pub use summary::{DailyStats, SessionStats, StatsAnalyzer, WeeklyStats};
