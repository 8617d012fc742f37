//! Error types for the edges of the audio subsystem
//!
//! Only setup, configuration, asset decoding and the device can fail.
//! The mixing hot path and the device callback never return errors.

use std::path::PathBuf;

/// Failure to load or validate configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid audio config: {0}")]
    Invalid(String),
}

/// Failure to decode a sound asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to decode WAV: {0}")]
    Decode(#[from] hound::Error),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    #[error("Sample rate mismatch: mixer runs at {expected} Hz, asset is {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },
}

/// Failure to bring up or control the audio device.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No audio output device available")]
    NoOutputDevice,

    #[error("Failed to query output configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("No output config supports {0} Hz")]
    UnsupportedSampleRate(u32),

    #[error("Unsupported sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to play audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Failed to pause audio stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),
}
