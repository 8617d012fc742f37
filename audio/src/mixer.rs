//! Game-thread mixer: voice control and per-tick mix steps

use tracing::debug;

use crate::channels::{ChannelTable, SlotState, SoundHandle};
use crate::metrics::AudioMetrics;
use crate::mixing::{mix_voice, to_pcm16};
use crate::ring::RingWriter;
use crate::sound::Sound;

/// Producer side of the audio subsystem
///
/// Owns the channel table, the ring's writer end and the scratch buffers.
/// Everything here runs on the game thread; the device thread only ever
/// sees what [`mix_next_frame`](Self::mix_next_frame) publishes.
pub struct Mixer {
    channels: ChannelTable,
    writer: RingWriter,
    /// Distance to keep between the generator and reader cursors
    target_lookahead: usize,
    /// Float accumulation scratch, `target_lookahead` long
    accum: Box<[f32]>,
    /// Converted PCM scratch, `target_lookahead` long
    pcm: Box<[i16]>,
    master_volume: f32,
    metrics: AudioMetrics,
}

impl Mixer {
    /// Create a mixer with `voices` slots that keeps `target_lookahead`
    /// samples ahead of the reader.
    ///
    /// The lookahead is capped below the ring capacity so the producer can
    /// never reach unread samples.
    pub fn new(voices: usize, writer: RingWriter, target_lookahead: usize) -> Self {
        let target_lookahead = target_lookahead.min(writer.capacity() - 1);
        debug!(
            "mixer: {} voices, lookahead {} of {} samples",
            voices,
            target_lookahead,
            writer.capacity()
        );
        Self {
            channels: ChannelTable::new(voices),
            writer,
            target_lookahead,
            accum: vec![0.0; target_lookahead].into_boxed_slice(),
            pcm: vec![0; target_lookahead].into_boxed_slice(),
            master_volume: 1.0,
            metrics: AudioMetrics::new(),
        }
    }

    /// Play `sound` once on the first free voice.
    ///
    /// Returns `None` when all voices are busy.
    pub fn start(&mut self, sound: &Sound) -> Option<SoundHandle> {
        self.channels.start(sound, SlotState::Playing)
    }

    /// Play `sound` on repeat until stopped.
    pub fn start_looping(&mut self, sound: &Sound) -> Option<SoundHandle> {
        self.channels.start(sound, SlotState::Looping)
    }

    /// Stop a sound. Stale handles are ignored.
    ///
    /// Samples already mixed for this voice still play out; nothing more is
    /// mixed from the next step on.
    pub fn stop(&mut self, handle: SoundHandle) -> bool {
        self.channels.stop(handle)
    }

    pub fn stop_all(&mut self) {
        self.channels.stop_all();
    }

    pub fn is_valid(&self, handle: SoundHandle) -> bool {
        self.channels.is_valid(handle)
    }

    pub fn active_voices(&self) -> usize {
        self.channels.active_count()
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    /// Set the master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn target_lookahead(&self) -> usize {
        self.target_lookahead
    }

    /// Samples the next step would mix given the current reader position.
    pub fn lookahead(&self) -> usize {
        self.target_lookahead.saturating_sub(self.writer.buffered())
    }

    pub fn writer(&self) -> &RingWriter {
        &self.writer
    }

    /// Mix exactly the missing lookahead and publish it to the ring.
    ///
    /// Call once per game tick. With no voice active the step still writes
    /// silence so the reader keeps finding samples. Returns the number of
    /// samples mixed (0 when the ring is already far enough ahead).
    pub fn mix_next_frame(&mut self) -> usize {
        let buffered = self.writer.buffered();
        let count = self.target_lookahead.saturating_sub(buffered);

        if count > 0 {
            let accum = &mut self.accum[..count];
            accum.fill(0.0);
            for slot in self
                .channels
                .slots_mut()
                .iter_mut()
                .filter(|slot| !slot.is_free())
            {
                mix_voice(slot, accum);
            }

            let pcm = &mut self.pcm[..count];
            to_pcm16(accum, self.master_volume, pcm);
            let written = self.writer.write(pcm);
            debug_assert_eq!(written, count, "lookahead must fit the free space");
        }

        self.metrics.record_step(buffered, count);
        self.metrics
            .maybe_log(self.writer.ring().stats(), self.writer.capacity());
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::MixRing;

    #[test]
    fn test_lookahead_capped_below_capacity() {
        let (writer, _reader) = MixRing::new(16).split();
        let mixer = Mixer::new(4, writer, 100);
        assert_eq!(mixer.target_lookahead(), 15);
    }

    #[test]
    fn test_first_step_fills_target() {
        let (writer, reader) = MixRing::new(32).split();
        let mut mixer = Mixer::new(4, writer, 10);
        assert_eq!(mixer.lookahead(), 10);
        assert_eq!(mixer.mix_next_frame(), 10);
        assert_eq!(reader.available(), 10);
    }

    #[test]
    fn test_step_without_reader_progress_is_noop() {
        let (writer, reader) = MixRing::new(32).split();
        let mut mixer = Mixer::new(4, writer, 10);
        mixer.mix_next_frame();
        assert_eq!(mixer.lookahead(), 0);
        assert_eq!(mixer.mix_next_frame(), 0);
        assert_eq!(reader.available(), 10);
    }

    #[test]
    fn test_step_tops_up_what_was_read() {
        let (writer, mut reader) = MixRing::new(32).split();
        let mut mixer = Mixer::new(4, writer, 10);
        mixer.mix_next_frame();

        let mut out = [0i16; 4];
        reader.read_into(&mut out);
        assert_eq!(mixer.lookahead(), 4);
        assert_eq!(mixer.mix_next_frame(), 4);
        assert_eq!(reader.available(), 10);
    }

    #[test]
    fn test_master_volume_clamped() {
        let (writer, _reader) = MixRing::new(8).split();
        let mut mixer = Mixer::new(1, writer, 4);
        mixer.set_master_volume(2.0);
        assert_eq!(mixer.master_volume(), 1.0);
        mixer.set_master_volume(-1.0);
        assert_eq!(mixer.master_volume(), 0.0);
        mixer.set_master_volume(f32::NAN);
        assert_eq!(mixer.master_volume(), 0.0);
    }

    #[test]
    fn test_stopped_voice_not_mixed_next_step() {
        let (writer, mut reader) = MixRing::new(32).split();
        let mut mixer = Mixer::new(2, writer, 4);
        let sound = Sound::from_samples(vec![500; 100]);
        let handle = mixer.start(&sound).unwrap();

        mixer.mix_next_frame();
        assert!(mixer.stop(handle));
        assert!(!mixer.is_valid(handle));

        let mut out = [0i16; 4];
        reader.read_into(&mut out);
        // Already published: plays out
        assert_eq!(out, [500; 4]);

        mixer.mix_next_frame();
        reader.read_into(&mut out);
        assert_eq!(out, [0; 4]);
    }
}
