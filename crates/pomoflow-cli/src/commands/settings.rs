use clap::Subcommand;
use pomoflow_core::storage::AppSettings;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting by dotted path (e.g. "audio.volume")
    Get {
        key: String,
    },
    /// Set a setting by dotted path
    Set {
        key: String,
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: SettingsAction) -> CliResult {
    match action {
        SettingsAction::Get { key } => {
            let settings = AppSettings::load()?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        SettingsAction::Set { key, value } => {
            let mut settings = AppSettings::load()?;
            settings.set(&key, &value)?;
            settings.save()?;
            println!("ok");
        }
        SettingsAction::List => {
            print_json(&AppSettings::load()?)?;
        }
        SettingsAction::Reset => {
            AppSettings::default().save()?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
