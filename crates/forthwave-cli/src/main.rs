//! forthwave - live-coding synthesizer driven by a Forth-style language.

mod commands;
mod console;
mod watch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forthwave")]
#[command(author, version, about = "Live-coding Forth synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a program on the audio device with a live console
    Play(commands::play::PlayArgs),

    /// Render a program to a WAV file
    Render(commands::render::RenderArgs),

    /// Compile a program without running it
    Check(commands::check::CheckArgs),

    /// List the words a program can use
    Words(commands::words::WordsArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Words(args) => commands::words::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
