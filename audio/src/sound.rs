//! PCM sound assets and WAV decoding

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::error::AssetError;

/// Sound data (raw PCM)
///
/// Immutable mono 16-bit samples at the mixer rate. Cloning shares the
/// buffer, so a voice keeps its asset alive for as long as it plays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sound {
    samples: Arc<[i16]>,
}

impl Sound {
    /// Wrap already-decoded mono samples.
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// Decode a WAV file, down-mixing to mono.
    ///
    /// The file must already be at `sample_rate`; resampling is not done here.
    pub fn from_wav(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let reader = WavReader::open(path)?;
        let sound = Self::decode(reader, sample_rate)?;
        debug!(
            "Loaded {} ({} samples)",
            path.display(),
            sound.samples.len()
        );
        Ok(sound)
    }

    /// Decode WAV data from any reader, down-mixing to mono.
    pub fn from_wav_reader<R: Read>(reader: R, sample_rate: u32) -> Result<Self, AssetError> {
        Self::decode(WavReader::new(reader)?, sample_rate)
    }

    fn decode<R: Read>(mut reader: WavReader<R>, sample_rate: u32) -> Result<Self, AssetError> {
        let spec = reader.spec();
        if spec.sample_rate != sample_rate {
            return Err(AssetError::SampleRateMismatch {
                expected: sample_rate,
                found: spec.sample_rate,
            });
        }
        if spec.channels == 0 {
            return Err(AssetError::UnsupportedFormat("zero channels".into()));
        }

        let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, bits @ 1..=16) => {
                // Narrow samples come back unscaled; widen to full 16-bit range
                let shift = 16 - bits;
                reader
                    .samples::<i16>()
                    .map(|s| s.map(|s| s << shift))
                    .collect::<Result<_, _>>()?
            }
            (SampleFormat::Int, bits @ 17..=32) => {
                let shift = bits - 16;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| (s >> shift) as i16))
                    .collect::<Result<_, _>>()?
            }
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .map(|s| s.map(|s| (s * 32767.0).round().clamp(-32768.0, 32767.0) as i16))
                .collect::<Result<_, _>>()?,
            (format, bits) => {
                return Err(AssetError::UnsupportedFormat(format!(
                    "{:?} with {} bits per sample",
                    format, bits
                )));
            }
        };

        Ok(Self::from_samples(downmix(&interleaved, spec.channels as usize)))
    }

    /// The decoded mono samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of samples in the asset.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length in seconds at `sample_rate`.
    pub fn duration(&self, sample_rate: u32) -> f32 {
        self.samples.len() as f32 / sample_rate as f32
    }
}

/// Average interleaved frames down to one mono sample each.
///
/// A trailing incomplete frame is averaged over the channels it has.
fn downmix(interleaved: &[i16], channels: usize) -> Vec<i16> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::io::Cursor;

    fn wav_bytes<S: hound::Sample + Copy>(spec: WavSpec, samples: &[S]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn int_spec(channels: u16, bits: u16, sample_rate: u32) -> WavSpec {
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn test_from_samples() {
        let sound = Sound::from_samples(vec![1, 2, 3]);
        assert_eq!(sound.len(), 3);
        assert!(!sound.is_empty());
        assert_eq!(sound.samples(), &[1, 2, 3]);
        assert!(Sound::from_samples(Vec::new()).is_empty());
    }

    #[test]
    fn test_clone_shares_buffer() {
        let sound = Sound::from_samples(vec![7; 16]);
        let clone = sound.clone();
        assert!(std::ptr::eq(sound.samples(), clone.samples()));
    }

    #[test]
    fn test_duration() {
        let sound = Sound::from_samples(vec![0; 22_050]);
        assert!((sound.duration(44_100) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decode_mono_i16() {
        let bytes = wav_bytes(int_spec(1, 16, 44_100), &[100i16, -200, 300]);
        let sound = Sound::from_wav_reader(Cursor::new(bytes), 44_100).unwrap();
        assert_eq!(sound.samples(), &[100, -200, 300]);
    }

    #[test]
    fn test_decode_stereo_downmix() {
        // Interleaved stereo [L, R, L, R, ...]
        let bytes = wav_bytes(int_spec(2, 16, 44_100), &[100i16, 200, 300, 400, -500, -700]);
        let sound = Sound::from_wav_reader(Cursor::new(bytes), 44_100).unwrap();
        assert_eq!(sound.samples(), &[150, 350, -600]);
    }

    #[test]
    fn test_decode_8_bit() {
        let bytes = wav_bytes(int_spec(1, 8, 44_100), &[127i8, -128, 64, 0]);
        let sound = Sound::from_wav_reader(Cursor::new(bytes), 44_100).unwrap();
        assert_eq!(sound.samples(), &[32512, -32768, 16384, 0]);
    }

    #[test]
    fn test_decode_24_bit() {
        let bytes = wav_bytes(int_spec(1, 24, 44_100), &[1000i32 << 8, -(1000i32 << 8)]);
        let sound = Sound::from_wav_reader(Cursor::new(bytes), 44_100).unwrap();
        assert_eq!(sound.samples(), &[1000, -1000]);
    }

    #[test]
    fn test_decode_float() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, &[0.0f32, 1.0, -1.0, 2.0]);
        let sound = Sound::from_wav_reader(Cursor::new(bytes), 44_100).unwrap();
        assert_eq!(sound.samples(), &[0, 32767, -32767, 32767]);
    }

    #[test]
    fn test_decode_rejects_rate_mismatch() {
        let bytes = wav_bytes(int_spec(1, 16, 22_050), &[0i16; 4]);
        let result = Sound::from_wav_reader(Cursor::new(bytes), 44_100);
        assert!(matches!(
            result,
            Err(AssetError::SampleRateMismatch {
                expected: 44_100,
                found: 22_050
            })
        ));
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result = Sound::from_wav_reader(Cursor::new(b"not a wav file".to_vec()), 44_100);
        assert!(matches!(result, Err(AssetError::Decode(_))));
    }

    #[test]
    fn test_from_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blip.wav");
        std::fs::write(&path, wav_bytes(int_spec(1, 16, 44_100), &[5i16; 10])).unwrap();

        let sound = Sound::from_wav(&path, 44_100).unwrap();
        assert_eq!(sound.len(), 10);
        assert!(sound.samples().iter().all(|&s| s == 5));
    }
}
