//! polyfm CLI - render and play scores through the polyfm synthesizer.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyfm")]
#[command(author, version, about = "Polyphonic FM synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a score to a WAV file
    Render(commands::render::RenderArgs),

    /// Play a score on an audio output device
    Play(commands::play::PlayArgs),

    /// Print the effective engine configuration as TOML
    Config(commands::config::ConfigArgs),

    /// List audio output devices
    Devices,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `polyfm config` output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Devices => commands::devices::run(),
    }
}
