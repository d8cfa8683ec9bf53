//! gridseek CLI - train, evaluate and play the grid-world seek task

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gridseek")]
#[command(version, about = "Grid-world testbed for online TD learning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a value function, optionally resuming from saved parameters
    Train(Box<gridseek::cli::commands::train::TrainArgs>),

    /// Evaluate saved parameters with a greedy policy
    Evaluate(gridseek::cli::commands::evaluate::EvaluateArgs),

    /// Play an episode with the keyboard
    Play(gridseek::cli::commands::play::PlayArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => gridseek::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => gridseek::cli::commands::evaluate::execute(args),
        Commands::Play(args) => gridseek::cli::commands::play::execute(args),
    }
}
