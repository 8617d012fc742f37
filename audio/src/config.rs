//! Configuration management (config.toml)
//!
//! Handles loading, saving, validating and providing defaults for the audio
//! subsystem. Settings are stored in TOML format in the platform-specific
//! config directory, or at an explicit path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::channels::DEFAULT_VOICES;
use crate::error::ConfigError;

/// Application configuration.
///
/// Serialized to/from TOML format for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Audio settings
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Audio configuration.
///
/// Every capacity here is fixed at setup; nothing is resized afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Mixer sample rate in Hz; sources must already be at this rate (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Number of channel slots, i.e. maximum simultaneous voices (default: 32)
    #[serde(default = "default_voices")]
    pub voices: usize,
    /// Ring buffer capacity in mono samples (default: 8820, ~200ms)
    #[serde(default = "default_ring_capacity")]
    pub ring_capacity: usize,
    /// How far the mixer stays ahead of the device, in milliseconds (default: 50)
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: u32,
    /// Master volume level (default: 1.0, range: 0.0-1.0)
    #[serde(default = "default_volume")]
    pub master_volume: f32,
    /// Mono scratch size of the device callback, in frames (default: 1024)
    #[serde(default = "default_callback_chunk_frames")]
    pub callback_chunk_frames: usize,
}

fn default_sample_rate() -> u32 {
    44_100
}
fn default_voices() -> usize {
    DEFAULT_VOICES
}
fn default_ring_capacity() -> usize {
    8820
}
fn default_lookahead_ms() -> u32 {
    50
}
fn default_volume() -> f32 {
    1.0
}
fn default_callback_chunk_frames() -> usize {
    1024
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            voices: default_voices(),
            ring_capacity: default_ring_capacity(),
            lookahead_ms: default_lookahead_ms(),
            master_volume: default_volume(),
            callback_chunk_frames: default_callback_chunk_frames(),
        }
    }
}

impl AudioConfig {
    /// Target producer lead over the reader, in samples.
    pub fn lookahead_samples(&self) -> usize {
        (self.sample_rate as u64 * self.lookahead_ms as u64 / 1000) as usize
    }

    /// Check that the configuration can drive the mixer.
    ///
    /// The lookahead must stay strictly below the ring capacity, otherwise
    /// the producer could catch up with unread samples.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be non-zero".into()));
        }
        if self.voices == 0 || self.voices > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "voices must be in 1..={} (got {})",
                u32::MAX,
                self.voices
            )));
        }
        if self.ring_capacity < 2 {
            return Err(ConfigError::Invalid(format!(
                "ring_capacity must be at least 2 (got {})",
                self.ring_capacity
            )));
        }
        let lookahead = self.lookahead_samples();
        if lookahead == 0 {
            return Err(ConfigError::Invalid(
                "lookahead_ms is shorter than one sample".into(),
            ));
        }
        if lookahead >= self.ring_capacity {
            return Err(ConfigError::Invalid(format!(
                "lookahead of {} samples does not fit a ring of {} samples",
                lookahead, self.ring_capacity
            )));
        }
        if !self.master_volume.is_finite() || !(0.0..=1.0).contains(&self.master_volume) {
            return Err(ConfigError::Invalid(format!(
                "master_volume must be in 0.0..=1.0 (got {})",
                self.master_volume
            )));
        }
        if self.callback_chunk_frames == 0 {
            return Err(ConfigError::Invalid(
                "callback_chunk_frames must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Kestrel\config`
/// On macOS: `~/Library/Application Support/io.kestrel.Kestrel`
/// On Linux: `~/.config/Kestrel`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.kestrel", "", "Kestrel")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Reads `config.toml` from the platform's configuration directory.
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join("config.toml")).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path.
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Saves the configuration to `path`, creating parent directories.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(io_err)
}

/// Saves the configuration to the platform's configuration directory.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    match config_dir() {
        Some(dir) => save_to(config, &dir.join("config.toml")),
        None => Ok(()),
    }
}
