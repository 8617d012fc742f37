//! Channel slot table and generation-checked sound handles
//!
//! A fixed array of voices owned by the game thread. Each slot carries a
//! generation counter that is bumped every time the slot is claimed, so a
//! [`SoundHandle`] issued for an earlier playback can never match the
//! sound that reuses its slot later.

use tracing::warn;

use crate::sound::Sound;

/// Maximum number of voices when no config is given
pub const DEFAULT_VOICES: usize = 32;

/// Weak reference to one playback instance.
///
/// Handles are plain values: copying or dropping one has no effect on the
/// sound. A handle goes stale once its sound finishes or is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle {
    slot: u32,
    generation: u32,
}

impl SoundHandle {
    /// A handle that never refers to a playing sound.
    ///
    /// Generations start at 1, so `{slot: 0, generation: 0}` is never issued.
    pub const INVALID: Self = Self {
        slot: 0,
        generation: 0,
    };

    /// Slot index this handle was issued for
    pub fn slot(&self) -> usize {
        self.slot as usize
    }

    /// Generation of the slot when the handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl Default for SoundHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Lifecycle state of a channel slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// Available for `start()`; holds no sound
    #[default]
    Free,
    /// Plays once, released when the sound is exhausted
    Playing,
    /// Wraps to the start when exhausted, until stopped
    Looping,
}

/// Playback state for one voice
#[derive(Debug, Default)]
pub struct ChannelSlot {
    pub(crate) state: SlotState,
    pub(crate) sound: Option<Sound>,
    /// Next sample index into `sound`
    pub(crate) cursor: usize,
    pub(crate) generation: u32,
}

impl ChannelSlot {
    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_free(&self) -> bool {
        self.state == SlotState::Free
    }

    /// Return the slot to `Free`, dropping its sound reference.
    pub(crate) fn release(&mut self) {
        self.state = SlotState::Free;
        self.sound = None;
        self.cursor = 0;
    }
}

/// Fixed-capacity table of voices
#[derive(Debug)]
pub struct ChannelTable {
    slots: Box<[ChannelSlot]>,
}

impl ChannelTable {
    /// Allocate `capacity` free slots. This is the only allocation the table makes.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0 && capacity <= u32::MAX as usize);
        Self {
            slots: (0..capacity).map(|_| ChannelSlot::default()).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Claim the first free slot for `sound`.
    ///
    /// Returns `None` when every slot is busy; the sound is dropped rather
    /// than stealing a voice.
    pub fn start(&mut self, sound: &Sound, state: SlotState) -> Option<SoundHandle> {
        debug_assert!(state != SlotState::Free, "start() needs a playing state");

        let Some(index) = self.slots.iter().position(ChannelSlot::is_free) else {
            warn!(
                "all {} channels busy, sound of {} samples dropped",
                self.slots.len(),
                sound.len()
            );
            return None;
        };

        let slot = &mut self.slots[index];
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            generation => generation,
        };
        slot.state = state;
        slot.sound = Some(sound.clone());
        slot.cursor = 0;

        Some(SoundHandle {
            slot: index as u32,
            generation: slot.generation,
        })
    }

    /// Stop the sound behind `handle`.
    ///
    /// Stale or invalid handles are ignored. Returns whether a sound was stopped.
    pub fn stop(&mut self, handle: SoundHandle) -> bool {
        if !self.is_valid(handle) {
            return false;
        }
        self.slots[handle.slot()].release();
        true
    }

    /// Free every occupied slot.
    pub fn stop_all(&mut self) {
        for slot in self.slots.iter_mut().filter(|slot| !slot.is_free()) {
            slot.release();
        }
    }

    /// Whether `handle` still refers to the sound it was issued for.
    pub fn is_valid(&self, handle: SoundHandle) -> bool {
        self.slots.get(handle.slot()).is_some_and(|slot| {
            !slot.is_free() && slot.generation == handle.generation
        })
    }

    /// Number of occupied slots.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_free()).count()
    }

    pub fn slot(&self, index: usize) -> Option<&ChannelSlot> {
        self.slots.get(index)
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [ChannelSlot] {
        &mut self.slots
    }
}
