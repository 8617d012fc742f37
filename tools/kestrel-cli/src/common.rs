//! Arguments and loading shared by `play` and `render`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use kestrel_audio::{AudioConfig, Sound, config};
use tracing::{info, warn};

/// Sounds to mix and how to tick the mixer
#[derive(Args)]
pub struct MixArgs {
    /// WAV files to start together
    #[arg(required = true)]
    pub sounds: Vec<PathBuf>,

    /// Stop after this many seconds
    #[arg(long)]
    pub seconds: Option<f32>,

    /// Game ticks per second (one mix step per tick)
    #[arg(long, default_value = "60")]
    pub tick_rate: u32,

    /// Config file (defaults to config.toml in the Kestrel config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl MixArgs {
    /// Load the audio section of the selected config.
    pub fn audio_config(&self) -> Result<AudioConfig> {
        let config = match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => config::load(),
        };
        Ok(config.audio)
    }

    pub fn tick_interval(&self) -> Result<Duration> {
        if self.tick_rate == 0 {
            bail!("--tick-rate must be positive");
        }
        Ok(Duration::from_secs(1) / self.tick_rate)
    }

    /// Time limit in samples, if any.
    pub fn sample_limit(&self, sample_rate: u32) -> Result<Option<usize>> {
        match self.seconds {
            Some(seconds) if !seconds.is_finite() || seconds < 0.0 => {
                bail!("--seconds must be a non-negative number, got {}", seconds)
            }
            Some(seconds) => Ok(Some((seconds * sample_rate as f32) as usize)),
            None => Ok(None),
        }
    }

    pub fn load_sounds(&self, sample_rate: u32) -> Result<Vec<Sound>> {
        self.sounds
            .iter()
            .map(|path| load_sound(path, sample_rate))
            .collect()
    }
}

fn load_sound(path: &Path, sample_rate: u32) -> Result<Sound> {
    let sound = Sound::from_wav(path, sample_rate)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    info!(
        "Loaded {} ({:.2}s)",
        path.display(),
        sound.duration(sample_rate)
    );
    Ok(sound)
}

/// Warn when a tick lasts longer than the mixer keeps buffered.
pub fn check_tick_budget(config: &AudioConfig, tick: Duration) {
    let lookahead = Duration::from_millis(config.lookahead_ms as u64);
    if tick > lookahead {
        warn!(
            "Tick of {:?} exceeds the {:?} lookahead; expect underruns",
            tick, lookahead
        );
    }
}
