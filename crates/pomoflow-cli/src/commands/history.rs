use pomoflow_core::format::format_duration;

use super::{open_engine, CliResult};

pub fn run(limit: usize) -> CliResult {
    let engine = open_engine()?;
    let history = engine.history();
    if history.is_empty() {
        println!("no sessions recorded");
        return Ok(());
    }

    for session in history.iter().rev().take(limit) {
        let outcome = if session.interrupted {
            "skipped"
        } else {
            "completed"
        };
        println!(
            "{}  {:<11}  {:>6} of {:>6}  {}",
            session.start_time.format("%Y-%m-%d %H:%M"),
            session.phase.display_name(),
            format_duration(session.actual_duration.max(0.0).round() as u64),
            format_duration(u64::from(session.planned_duration)),
            outcome
        );
    }
    Ok(())
}
