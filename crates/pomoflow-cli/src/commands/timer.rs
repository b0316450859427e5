use clap::Subcommand;

use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current phase, or continue a paused session
    Start,
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Drop the open session and rewind the current phase
    Reset,
    /// Abandon the current phase and move to the next one
    Skip,
    /// Print current timer state as JSON
    Status,
    /// Clear today's sessions and start over at focus
    NewDay,
}

/// Each invocation runs one command against the persisted engine. The
/// countdown only advances inside `pomoflow-cli run`; a session left open by
/// an earlier invocation is restored as paused.
pub fn run(action: TimerAction) -> CliResult {
    let mut engine = open_engine()?;

    let event = match action {
        TimerAction::Start => engine.start(),
        TimerAction::Pause => engine.pause(),
        TimerAction::Resume => engine.resume(),
        TimerAction::Reset => engine.reset(),
        TimerAction::Skip => engine.skip(),
        TimerAction::Status => None,
        TimerAction::NewDay => Some(engine.reset_daily_progress()),
    };

    match event {
        Some(event) => print_json(&event),
        None => print_json(&engine.snapshot()),
    }
}
