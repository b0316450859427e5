use clap::Subcommand;
use pomoflow_core::storage::{TimerConfig, TimerConfigPatch};

use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "focus_duration", "auto_start_next")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    let mut engine = open_engine()?;

    match action {
        ConfigAction::Get { key } => {
            let config = serde_json::to_value(engine.config())?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let patch = TimerConfigPatch::from_key_value(&key, &value)?;
            engine.update_config(&patch)?;
            println!("ok");
        }
        ConfigAction::List => {
            print_json(engine.config())?;
        }
        ConfigAction::Reset => {
            engine.update_config(&TimerConfigPatch::from(TimerConfig::default()))?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
