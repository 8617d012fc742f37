//! Kestrel audio core
//!
//! Fixed-capacity voice mixer that runs on the game thread and hands
//! pre-mixed PCM to the device callback through a lock-free ring buffer.
//!
//! Architecture:
//! - The game thread starts/stops sounds on a fixed [`ChannelTable`] and
//!   calls [`AudioSystem::mix_next_frame`] once per tick
//! - The [`Mixer`] sums every active voice into a float scratch buffer,
//!   clamps to 16-bit PCM and appends exactly the missing lookahead to the
//!   ring through its [`RingWriter`]
//! - The device thread runs an [`AudioCallback`] that copies what the
//!   producer published through the [`RingReader`], or silence on underrun
//!
//! ```text
//! Game Thread                                      Device Thread
//!     │                                                  │
//! [start/stop]──►[ChannelTable]                          │
//!     │                                                  │
//! [mix_next_frame]──►[Mixer]──(ring + cursors)──►[AudioCallback]
//! ```
//!
//! Audio specs:
//! - Mono, 16-bit signed PCM sources at the mixer rate (44,100 Hz default)
//! - No allocation or locking on either thread after setup

mod callback;
pub mod channels;
pub mod config;
mod error;
mod metrics;
mod mixer;
mod mixing;
mod output;
pub mod ring;
mod sound;
mod system;


// Re-export public API
pub use callback::AudioCallback;
pub use channels::{ChannelTable, SlotState, SoundHandle};
pub use config::{AudioConfig, Config};
pub use error::{AssetError, AudioError, ConfigError};
pub use metrics::{CallbackStats, StatsSnapshot};
pub use mixer::Mixer;
pub use mixing::to_pcm16;
pub use output::AudioOutput;
pub use ring::{MixRing, RingReader, RingWriter};
pub use sound::Sound;
pub use system::AudioSystem;
