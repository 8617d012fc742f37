//! Device-facing consumer of the mixed ring
//!
//! Runs on the OS audio thread. Every path here is bounded copying: no
//! allocation, no locks, no logging. Underruns are only counted.

use cpal::{FromSample, Sample};

use crate::ring::RingReader;

/// Consumer end of the audio subsystem, handed to the device stream
pub struct AudioCallback {
    reader: RingReader,
    /// Mono scratch for interleaved device buffers, allocated once
    scratch: Box<[i16]>,
}

impl AudioCallback {
    /// `chunk_frames` bounds how many frames are converted per pass.
    pub fn new(reader: RingReader, chunk_frames: usize) -> Self {
        Self {
            reader,
            scratch: vec![0; chunk_frames.max(1)].into_boxed_slice(),
        }
    }

    /// Fill a mono buffer from the ring.
    ///
    /// Copies what is available, zero-fills the rest and returns the number
    /// of samples copied. An empty ring yields pure silence and leaves the
    /// reader cursor where it was.
    pub fn fill_mono(&mut self, out: &mut [i16]) -> usize {
        let copied = self.reader.read_into(out);
        self.reader.stats().record(out.len(), copied);
        copied
    }

    /// Fill an interleaved device buffer with `channels` channels.
    ///
    /// Each mono sample is duplicated across the channels of its frame and
    /// converted to the device sample type. Once the ring runs dry the rest
    /// of the buffer is silence. Returns the number of frames taken from the
    /// ring.
    pub fn render<T>(&mut self, out: &mut [T], channels: usize) -> usize
    where
        T: Sample + FromSample<i16>,
    {
        let channels = channels.max(1);
        let frames = out.len() / channels;
        let mut copied = 0;
        let mut dry = false;

        for block in out.chunks_mut(self.scratch.len() * channels) {
            if dry {
                block.fill(T::EQUILIBRIUM);
                continue;
            }

            let block_frames = block.len() / channels;
            let mono = &mut self.scratch[..block_frames];
            let read = self.reader.read_into(mono);
            copied += read;

            for (frame, &sample) in block.chunks_mut(channels).zip(mono.iter()) {
                frame.fill(T::from_sample(sample));
            }
            // Trailing partial frame
            block[block_frames * channels..].fill(T::EQUILIBRIUM);
            dry = read < block_frames;
        }

        self.reader.stats().record(frames, copied);
        copied
    }

    pub fn reader(&self) -> &RingReader {
        &self.reader
    }
}
