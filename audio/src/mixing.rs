//! Audio mixing utilities: voice accumulation and 16-bit conversion

use crate::channels::{ChannelSlot, SlotState};

/// Add one voice into `accum` and advance its cursor.
///
/// Contributes at most the samples left in the sound, never reading past
/// its end. A looping voice wraps to the start within the same call; a
/// one-shot voice that runs out is released. Returns the number of samples
/// contributed.
pub(crate) fn mix_voice(slot: &mut ChannelSlot, accum: &mut [f32]) -> usize {
    let Some(sound) = slot.sound.as_ref() else {
        slot.release();
        return 0;
    };
    let samples = sound.samples();
    let looping = slot.state == SlotState::Looping;

    let mut offset = 0;
    while offset < accum.len() {
        if slot.cursor >= samples.len() {
            // An empty sound would loop forever without contributing
            if !looping || samples.is_empty() {
                break;
            }
            slot.cursor = 0;
        }

        let take = (samples.len() - slot.cursor).min(accum.len() - offset);
        let source = &samples[slot.cursor..slot.cursor + take];
        for (acc, &sample) in accum[offset..offset + take].iter_mut().zip(source) {
            *acc += sample as f32;
        }
        slot.cursor += take;
        offset += take;
    }

    let exhausted = slot.cursor >= samples.len();
    if exhausted {
        if looping && !samples.is_empty() {
            slot.cursor = 0;
        } else {
            slot.release();
        }
    }
    offset
}

/// Convert accumulated samples to clamped 16-bit PCM.
///
/// Overlapping voices can exceed the 16-bit range; they saturate at
/// `i16::MIN`/`i16::MAX` instead of wrapping. `volume` scales the mix
/// before rounding.
pub fn to_pcm16(accum: &[f32], volume: f32, out: &mut [i16]) {
    debug_assert_eq!(accum.len(), out.len());
    for (dst, &acc) in out.iter_mut().zip(accum) {
        *dst = (acc * volume)
            .round()
            .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{ChannelTable, SlotState};
    use crate::sound::Sound;

    fn table_with(sound: &Sound, state: SlotState) -> ChannelTable {
        let mut table = ChannelTable::new(1);
        table.start(sound, state).unwrap();
        table
    }

    #[test]
    fn test_mix_voice_partial_tail() {
        let sound = Sound::from_samples(vec![3; 5]);
        let mut table = table_with(&sound, SlotState::Playing);
        let mut accum = [0.0f32; 8];

        let mixed = mix_voice(&mut table.slots_mut()[0], &mut accum);
        assert_eq!(mixed, 5);
        assert_eq!(accum, [3.0, 3.0, 3.0, 3.0, 3.0, 0.0, 0.0, 0.0]);
        assert!(table.slot(0).unwrap().is_free());
    }

    #[test]
    fn test_mix_voice_advances_cursor() {
        let sound = Sound::from_samples((0..10).collect());
        let mut table = table_with(&sound, SlotState::Playing);
        let mut accum = [0.0f32; 4];

        mix_voice(&mut table.slots_mut()[0], &mut accum);
        assert_eq!(accum, [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(table.slot(0).unwrap().cursor(), 4);

        accum.fill(0.0);
        mix_voice(&mut table.slots_mut()[0], &mut accum);
        assert_eq!(accum, [4.0, 5.0, 6.0, 7.0]);
        assert_eq!(table.slot(0).unwrap().state(), SlotState::Playing);
    }

    #[test]
    fn test_mix_voice_loops_within_one_call() {
        let sound = Sound::from_samples(vec![1, 2, 3]);
        let mut table = table_with(&sound, SlotState::Looping);
        let mut accum = [0.0f32; 7];

        assert_eq!(mix_voice(&mut table.slots_mut()[0], &mut accum), 7);
        assert_eq!(accum, [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
        let slot = table.slot(0).unwrap();
        assert_eq!(slot.state(), SlotState::Looping);
        assert_eq!(slot.cursor(), 1);
    }

    #[test]
    fn test_mix_voice_empty_sound_is_released() {
        let sound = Sound::from_samples(Vec::new());
        for state in [SlotState::Playing, SlotState::Looping] {
            let mut table = table_with(&sound, state);
            let mut accum = [0.0f32; 4];
            assert_eq!(mix_voice(&mut table.slots_mut()[0], &mut accum), 0);
            assert_eq!(accum, [0.0; 4]);
            assert!(table.slot(0).unwrap().is_free());
        }
    }

    #[test]
    fn test_to_pcm16_rounds() {
        let mut out = [0i16; 4];
        to_pcm16(&[0.4, 0.6, -0.6, 1000.0], 1.0, &mut out);
        assert_eq!(out, [0, 1, -1, 1000]);
    }

    #[test]
    fn test_to_pcm16_clamps_not_wraps() {
        let mut out = [0i16; 4];
        to_pcm16(&[40_000.0, -40_000.0, 32_767.4, -32_768.4], 1.0, &mut out);
        assert_eq!(out, [i16::MAX, i16::MIN, i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_to_pcm16_applies_volume_before_clamp() {
        let mut out = [0i16; 2];
        to_pcm16(&[40_000.0, 1000.0], 0.5, &mut out);
        assert_eq!(out, [20_000, 500]);
    }
}
