use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pomoflow-cli", version, about = "Pomoflow CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Run the timer in the foreground until ctrl-c
    Run,
    /// Timer configuration (durations, cycle, auto-start)
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Application settings (notifications, audio)
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Session statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recent sessions, newest first
    History {
        /// Number of sessions to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn init_tracing() {
    // POMOFLOW_LOG takes EnvFilter directives; quiet by default.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("POMOFLOW_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Run => commands::run::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Stats { json } => commands::stats::run(json),
        Commands::History { limit } => commands::history::run(limit),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
