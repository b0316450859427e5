use std::io::Write;
use std::time::Duration;

use pomoflow_core::format::format_time;
use pomoflow_core::{Event, TimerService};
use tokio::sync::broadcast::error::RecvError;

use super::{open_engine, CliResult};

/// Foreground countdown. Starts (or continues) the current phase and keeps
/// ticking until the timer stops or ctrl-c is pressed. Ctrl-c pauses when
/// pausing is allowed; either way the session stays open for the next run.
pub fn run() -> CliResult {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_foreground())
}

/// What to tell the user after ctrl-c, given the result of pausing.
fn interrupt_message(paused: Option<&Event>) -> &'static str {
    match paused {
        Some(Event::TimerPaused { .. }) => "paused",
        _ => "stopped; the open session is restored paused on the next run",
    }
}

async fn run_foreground() -> CliResult {
    let service = TimerService::new(open_engine()?);
    let mut events = service.subscribe();

    if !service.with_engine(|engine| engine.is_running()).await {
        service.start().await;
    }

    let mut render = tokio::time::interval(Duration::from_millis(500));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                println!();
                println!("{}", interrupt_message(service.pause().await.as_ref()));
                break;
            }
            event = events.recv() => match event {
                Ok(Event::TimerCompleted { session, daily_goal_reached, auto_start_in_ms, .. }) => {
                    println!();
                    println!("{} complete", session.phase.display_name());
                    if daily_goal_reached {
                        println!("daily goal reached");
                    }
                    if auto_start_in_ms.is_none() {
                        break;
                    }
                }
                Ok(Event::PhaseAdvanced { to, .. }) => {
                    println!("starting {}", to.display_name());
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event receiver lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = render.tick() => {
                let (phase, remaining, count, total) = service
                    .with_engine(|e| (e.phase(), e.time_remaining(), e.session_count(), e.total_sessions()))
                    .await;
                print!("\r{:<11} {}  [{count}/{total}]", phase.display_name(), format_time(remaining));
                std::io::stdout().flush()?;
            }
        }
    }

    service.shutdown().await;
    Ok(())
}
