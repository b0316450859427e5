use chrono::Utc;
use pomoflow_core::format::format_duration;
use pomoflow_core::stats::{DailyStats, SessionStats, StatsAnalyzer};
use serde::Serialize;

use super::{open_engine, print_json, CliResult};

#[derive(Serialize)]
struct StatsReport {
    today: DailyStats,
    #[serde(flatten)]
    all: SessionStats,
}

fn minutes(value: f64) -> String {
    format_duration(value.max(0.0).round() as u64)
}

pub fn run(json: bool) -> CliResult {
    let engine = open_engine()?;
    let analyzer = StatsAnalyzer::new(engine.history());
    let today = Utc::now().date_naive();
    let report = StatsReport {
        today: analyzer.day(today),
        all: analyzer.summary(today),
    };

    if json {
        return print_json(&report);
    }

    let StatsReport { today, all } = report;
    println!(
        "Today:     {}/{} focus sessions, {} focused",
        engine.session_count(),
        engine.total_sessions(),
        minutes(today.focus_minutes)
    );
    println!(
        "All time:  {} sessions ({} completed, {:.0}%)",
        all.total_sessions,
        all.completed_sessions,
        all.completion_rate * 100.0
    );
    println!(
        "Focus:     {}    Breaks: {}",
        minutes(all.total_focus_minutes),
        minutes(all.total_break_minutes)
    );
    println!("Streak:    {} day(s)", all.streak);
    if let Some(last) = all.last_session_date {
        println!("Last:      {last}");
    }
    for week in &all.weekly {
        println!(
            "  {}  {:>3} sessions  {:>8}  {:.0}%",
            week.week,
            week.sessions,
            minutes(week.focus_minutes),
            week.completion_rate * 100.0
        );
    }
    Ok(())
}
