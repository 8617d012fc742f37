//! Audio subsystem lifecycle: setup, terminate and the playback surface

use tracing::{debug, info, warn};

use crate::callback::AudioCallback;
use crate::channels::SoundHandle;
use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::mixer::Mixer;
use crate::output::AudioOutput;
use crate::ring::MixRing;
use crate::sound::Sound;

/// Kestrel audio subsystem
///
/// Owns the game-thread [`Mixer`] and, when backed by a device, the output
/// stream whose callback holds the other end of the ring. One instance per
/// output device; everything is allocated in [`setup`](Self::setup) and
/// released in [`terminate`](Self::terminate).
pub struct AudioSystem {
    mixer: Mixer,
    /// Device stream, `None` when running headless
    output: Option<AudioOutput>,
    sample_rate: u32,
}

impl AudioSystem {
    /// Allocate the mixer and ring, then start the default output device.
    pub fn setup(config: &AudioConfig) -> Result<Self, AudioError> {
        let (mixer, callback) = Self::build(config)?;
        let output = AudioOutput::open(callback, config.sample_rate)?;
        info!(
            "Audio ready: {} voices at {}Hz, {} channel(s) out",
            config.voices,
            output.sample_rate(),
            output.channels()
        );
        Ok(Self {
            mixer,
            output: Some(output),
            sample_rate: config.sample_rate,
        })
    }

    /// Same wiring as [`setup`](Self::setup) without a device.
    ///
    /// The returned callback must be driven by the caller, e.g. for offline
    /// rendering. It may be moved to another thread.
    pub fn headless(config: &AudioConfig) -> Result<(Self, AudioCallback), AudioError> {
        let (mixer, callback) = Self::build(config)?;
        debug!("Audio running headless");
        Ok((
            Self {
                mixer,
                output: None,
                sample_rate: config.sample_rate,
            },
            callback,
        ))
    }

    fn build(config: &AudioConfig) -> Result<(Mixer, AudioCallback), AudioError> {
        config.validate()?;
        let (writer, reader) = MixRing::new(config.ring_capacity).split();
        let mut mixer = Mixer::new(config.voices, writer, config.lookahead_samples());
        mixer.set_master_volume(config.master_volume);
        let callback = AudioCallback::new(reader, config.callback_chunk_frames);
        Ok((mixer, callback))
    }

    /// Stop the device and release every buffer.
    pub fn terminate(self) {
        if let Some(output) = &self.output
            && let Err(e) = output.pause()
        {
            warn!("Failed to pause audio stream on shutdown: {}", e);
        }
        debug!(
            "Audio terminated with {} voice(s) still active",
            self.mixer.active_voices()
        );
        // Dropping the stream stops the device callback
        drop(self);
    }

    /// Play `sound` once. `None` means every voice was busy and it was dropped.
    pub fn start(&mut self, sound: &Sound) -> Option<SoundHandle> {
        self.mixer.start(sound)
    }

    /// Play `sound` on repeat until stopped.
    pub fn start_looping(&mut self, sound: &Sound) -> Option<SoundHandle> {
        self.mixer.start_looping(sound)
    }

    /// Stop a sound; stale handles are a no-op.
    pub fn stop(&mut self, handle: SoundHandle) -> bool {
        self.mixer.stop(handle)
    }

    pub fn stop_all(&mut self) {
        self.mixer.stop_all();
    }

    /// Whether `handle` still refers to a playing sound.
    pub fn is_valid(&self, handle: SoundHandle) -> bool {
        self.mixer.is_valid(handle)
    }

    /// Mix the next step. Call exactly once per game tick.
    pub fn mix_next_frame(&mut self) -> usize {
        self.mixer.mix_next_frame()
    }

    /// Set the master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, volume: f32) {
        self.mixer.set_master_volume(volume);
    }

    /// Pause the device. A no-op when headless.
    pub fn pause(&self) -> Result<(), AudioError> {
        match &self.output {
            Some(output) => output.pause(),
            None => Ok(()),
        }
    }

    /// Resume the device. A no-op when headless.
    pub fn resume(&self) -> Result<(), AudioError> {
        match &self.output {
            Some(output) => output.resume(),
            None => Ok(()),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.active_voices()
    }

    /// Mixer sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_headless(&self) -> bool {
        self.output.is_none()
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }
}
