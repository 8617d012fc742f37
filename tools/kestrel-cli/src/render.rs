//! Render command - offline mixing into a WAV file
//!
//! Uses a headless audio system and plays the device thread's part by hand:
//! every tick mixes one step, then pulls one device period through the
//! callback. The output holds exactly what a device would have received,
//! underrun silence included.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use kestrel_audio::{AudioCallback, AudioSystem, Sound};
use tracing::{info, warn};

use crate::common::{MixArgs, check_tick_budget};

/// Arguments for the render command
#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub mix: MixArgs,

    /// Output WAV path
    #[arg(short, long)]
    pub out: PathBuf,

    /// Samples the simulated device pulls per tick (defaults to one tick's worth)
    #[arg(long)]
    pub device_frames: Option<usize>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let config = args.mix.audio_config()?;
    let tick = args.mix.tick_interval()?;
    check_tick_budget(&config, tick);
    let limit = args.mix.sample_limit(config.sample_rate)?;
    let sounds = args.mix.load_sounds(config.sample_rate)?;

    let device_frames = args
        .device_frames
        .unwrap_or((config.sample_rate / args.mix.tick_rate) as usize);
    if device_frames == 0 {
        bail!("--device-frames must be positive");
    }
    if device_frames > config.lookahead_samples() {
        warn!(
            "Device period of {} samples exceeds the {} sample lookahead; output will have gaps",
            device_frames,
            config.lookahead_samples()
        );
    }

    let (mut audio, mut callback) =
        AudioSystem::headless(&config).context("Failed to set up the mixer")?;
    let samples = render(&mut audio, &mut callback, &sounds, device_frames, limit);

    write_wav(&args.out, &samples, config.sample_rate)?;
    let stats = callback.reader().stats().snapshot();
    info!(
        "Rendered {} samples to {} ({} underrun(s), {} partial)",
        samples.len(),
        args.out.display(),
        stats.underruns,
        stats.partial_underruns
    );
    audio.terminate();
    Ok(())
}

/// Start `sounds` and run ticks until they finish or `limit` samples exist.
///
/// Without a limit, looping sounds would never finish; `render` only starts
/// one-shots, so it always terminates.
fn render(
    audio: &mut AudioSystem,
    callback: &mut AudioCallback,
    sounds: &[Sound],
    device_frames: usize,
    limit: Option<usize>,
) -> Vec<i16> {
    for sound in sounds {
        if audio.start(sound).is_none() {
            warn!("Out of voices; some sounds will not be rendered");
        }
    }

    let mut output = Vec::new();
    let mut period = vec![0i16; device_frames];

    loop {
        audio.mix_next_frame();
        callback.fill_mono(&mut period);
        output.extend_from_slice(&period);

        if let Some(limit) = limit {
            if output.len() >= limit {
                output.truncate(limit);
                break;
            }
        } else if audio.active_voices() == 0 {
            // Everything is mixed; drain what is still buffered
            let mut tail = vec![0i16; callback.reader().available()];
            callback.fill_mono(&mut tail);
            output.extend_from_slice(&tail);
            break;
        }
    }

    output
}

fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_audio::AudioConfig;

    fn headless() -> (AudioSystem, AudioCallback) {
        let config = AudioConfig {
            lookahead_ms: 1,
            ring_capacity: 256,
            ..AudioConfig::default()
        };
        AudioSystem::headless(&config).unwrap()
    }

    #[test]
    fn test_render_plays_sound_then_stops() {
        let (mut audio, mut callback) = headless();
        let sound = Sound::from_samples((1..=100).collect());

        let samples = render(&mut audio, &mut callback, &[sound], 10, None);

        // 44-sample lookahead, 10-sample periods: the sound arrives intact
        // and the tail is at most one lookahead of silence
        assert_eq!(&samples[..100], (1..=100).collect::<Vec<i16>>().as_slice());
        assert!(samples[100..].iter().all(|&s| s == 0));
        assert!(samples.len() <= 100 + 44);
        assert_eq!(callback.reader().stats().snapshot().underruns, 0);
    }

    #[test]
    fn test_render_honours_limit() {
        let (mut audio, mut callback) = headless();
        let sound = Sound::from_samples(vec![500; 1000]);

        let samples = render(&mut audio, &mut callback, &[sound], 32, Some(70));
        assert_eq!(samples, vec![500; 70]);
    }

    #[test]
    fn test_render_large_period_has_gaps() {
        let (mut audio, mut callback) = headless();
        let sound = Sound::from_samples(vec![7; 200]);

        let samples = render(&mut audio, &mut callback, &[sound], 64, Some(128));
        // Each 64-sample pull only finds the 44-sample lookahead
        assert_eq!(&samples[..44], &[7; 44]);
        assert_eq!(&samples[44..64], &[0; 20]);
        assert!(callback.reader().stats().snapshot().partial_underruns > 0);
    }

    #[test]
    fn test_write_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        write_wav(&path, &[1, -2, 3], 22_050).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 22_050);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, [1, -2, 3]);
    }
}
