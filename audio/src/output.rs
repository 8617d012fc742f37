//! Audio output using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig, SupportedStreamConfigRange};
use tracing::{debug, error};

use crate::callback::AudioCallback;
use crate::error::AudioError;

/// Audio output device stream driven by an [`AudioCallback`]
pub struct AudioOutput {
    /// The cpal stream (kept alive for the duration)
    stream: cpal::Stream,
    /// Output sample rate
    sample_rate: u32,
    /// Interleaved device channels
    channels: u16,
}

impl AudioOutput {
    /// Open the default output device at `sample_rate` and start playing.
    ///
    /// `callback` is moved into the device thread; it is the only thing the
    /// stream captures.
    pub fn open(callback: AudioCallback, sample_rate: u32) -> Result<Self, AudioError> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        // Prefer the fewest channels (we duplicate mono) and f32, then i16, then u16
        let supported = device
            .supported_output_configs()?
            .filter(|range| supports_rate(range, sample_rate))
            .filter_map(|range| format_rank(range.sample_format()).map(|rank| (range, rank)))
            .min_by_key(|(range, rank)| (range.channels(), *rank))
            .map(|(range, _)| range)
            .ok_or(AudioError::UnsupportedSampleRate(sample_rate))?
            .with_sample_rate(cpal::SampleRate(sample_rate));

        let format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let channels = config.channels;

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, callback)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, callback)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, callback)?,
            other => return Err(AudioError::UnsupportedSampleFormat(other)),
        };

        stream.play()?;

        debug!(
            "Audio stream started: {}Hz, {} channel(s), {:?}",
            sample_rate, channels, format
        );

        Ok(Self {
            stream,
            sample_rate,
            channels,
        })
    }

    /// Suspend the device callback.
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream.pause()?;
        Ok(())
    }

    /// Resume the device callback.
    pub fn resume(&self) -> Result<(), AudioError> {
        self.stream.play()?;
        Ok(())
    }

    /// Get the output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn supports_rate(range: &SupportedStreamConfigRange, sample_rate: u32) -> bool {
    range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
}

fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::F32 => Some(0),
        SampleFormat::I16 => Some(1),
        SampleFormat::U16 => Some(2),
        _ => None,
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut callback: AudioCallback,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<i16>,
{
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            callback.render(data, channels);
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rank_prefers_f32() {
        assert!(format_rank(SampleFormat::F32) < format_rank(SampleFormat::I16));
        assert!(format_rank(SampleFormat::I16) < format_rank(SampleFormat::U16));
        assert_eq!(format_rank(SampleFormat::U8), None);
    }
}
