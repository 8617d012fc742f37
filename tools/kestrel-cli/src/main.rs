//! Kestrel CLI - drive the audio mixer from the command line
//!
//! # Commands
//!
//! - `kestrel play` - Play WAV files on the default output device
//! - `kestrel render` - Mix WAV files offline into a 16-bit mono WAV
//!
//! # Usage
//!
//! ```bash
//! # Play two sounds together, looping for 10 seconds
//! kestrel play laser.wav engine.wav --loop --seconds 10
//!
//! # Render exactly what the device callback would receive
//! kestrel render laser.wav engine.wav --out mix.wav --device-frames 512
//! ```
//!
//! Both commands read `config.toml` from the Kestrel config directory unless
//! `--config` points elsewhere. Set `RUST_LOG=kestrel_audio=debug` for
//! mixer diagnostics.

mod common;
mod play;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Kestrel CLI - drive the audio mixer from the command line
#[derive(Parser)]
#[command(name = "kestrel")]
#[command(about = "Play and render sounds through the Kestrel mixer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play WAV files on the default output device
    Play(play::PlayArgs),

    /// Mix WAV files offline into a WAV file
    Render(render::RenderArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play::execute(args),
        Commands::Render(args) => render::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "kestrel", "render", "a.wav", "b.wav", "--out", "mix.wav", "--seconds", "2",
        ])
        .unwrap();
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.mix.sounds.len(), 2);
        assert_eq!(args.out.to_str(), Some("mix.wav"));
        assert_eq!(args.mix.seconds, Some(2.0));
        assert_eq!(args.mix.tick_rate, 60);
    }

    #[test]
    fn test_play_requires_a_sound() {
        assert!(Cli::try_parse_from(["kestrel", "play"]).is_err());
    }
}
