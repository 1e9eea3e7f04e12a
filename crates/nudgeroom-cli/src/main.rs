use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "nudgeroom-cli", version, about = "Nudgeroom CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Fired nudge history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Intensity presets
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Run a single engine tick
    Tick(commands::engine::TickArgs),
    /// Run the scheduler until interrupted
    Run(commands::engine::RunArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Tick(args) => commands::engine::tick(args),
        Commands::Run(args) => commands::engine::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
