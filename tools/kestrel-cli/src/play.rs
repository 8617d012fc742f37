//! Play command - real-time playback on the default output device
//!
//! Runs a fixed-rate tick loop on the main thread, standing in for a game:
//! one `mix_next_frame` per tick until every voice is done or the time
//! limit passes.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Args;
use kestrel_audio::AudioSystem;
use tracing::{info, warn};

use crate::common::{MixArgs, check_tick_budget};

/// Arguments for the play command
#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub mix: MixArgs,

    /// Loop every sound until the time limit
    #[arg(long = "loop")]
    pub looping: bool,
}

/// Execute the play command
pub fn execute(args: PlayArgs) -> Result<()> {
    if args.looping && args.mix.seconds.is_none() {
        bail!("--loop needs --seconds to know when to stop");
    }

    let config = args.mix.audio_config()?;
    let tick = args.mix.tick_interval()?;
    check_tick_budget(&config, tick);
    let limit = args.mix.sample_limit(config.sample_rate)?;
    let sounds = args.mix.load_sounds(config.sample_rate)?;

    let mut audio = AudioSystem::setup(&config).context("Failed to start audio output")?;

    for sound in &sounds {
        let handle = if args.looping {
            audio.start_looping(sound)
        } else {
            audio.start(sound)
        };
        if handle.is_none() {
            warn!("Out of voices; some sounds will not play");
        }
    }

    let started = Instant::now();
    let mut next_tick = started;
    let mut mixed = 0usize;
    loop {
        mixed += audio.mix_next_frame();

        if audio.active_voices() == 0 {
            break;
        }
        if limit.is_some_and(|limit| mixed >= limit) {
            break;
        }

        next_tick += tick;
        if let Some(wait) = next_tick.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    // Let the last lookahead play out before the stream is dropped
    if !args.looping {
        thread::sleep(Duration::from_millis(config.lookahead_ms as u64));
    }

    info!(
        "Played {:.2}s of audio in {:.2}s",
        mixed as f32 / config.sample_rate as f32,
        started.elapsed().as_secs_f32()
    );
    audio.terminate();
    Ok(())
}
