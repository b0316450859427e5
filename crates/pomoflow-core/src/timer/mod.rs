mod clock;
mod engine;
mod phase;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{count_focus_sessions, Collaborators, LifecycleState, TimerEngine, AUTO_START_DELAY};
pub use phase::{duration_for, duration_secs_for, next_phase, should_take_long_break, Phase};
pub use session::{close_session, create_session, reconcile, Reconciliation, TimerSession};
