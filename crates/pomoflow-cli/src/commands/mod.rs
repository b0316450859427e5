pub mod config;
pub mod history;
pub mod run;
pub mod settings;
pub mod stats;
pub mod timer;

use pomoflow_core::storage::{AppSettings, SqliteStore};
use pomoflow_core::timer::{Collaborators, SystemClock, TimerEngine};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the engine over the on-disk store, with collaborators configured
/// from the user's settings.
pub fn open_engine() -> Result<TimerEngine<SqliteStore>, Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    let settings = AppSettings::load_or_default();
    Ok(TimerEngine::load_with(
        store,
        SystemClock,
        Collaborators::logging(&settings),
    ))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
