//! Lock-free single-producer single-consumer ring of mixed samples
//!
//! - The mixer WRITES samples and advances `generator_cursor` (producer)
//! - The device callback READS samples and advances `reader_cursor` (consumer)
//! - Each cursor has exactly one writer, so plain atomic loads and stores
//!   are enough; no compare-and-swap, no mutex
//! - The unread region is the circular range `[reader_cursor, generator_cursor)`
//!
//! Both cursors are kept modulo the capacity. Equal cursors mean "empty",
//! so at most `capacity - 1` samples can be unread at once.
//!
//! Publication order: sample stores happen before the `Release` store of the
//! cursor that exposes them, and the other side `Acquire`-loads that cursor
//! before touching the samples. The same pairing on `reader_cursor` keeps the
//! producer from overwriting samples the consumer is still copying.

use std::sync::Arc;
use std::sync::atomic::{AtomicI16, AtomicUsize, Ordering};

use crate::metrics::CallbackStats;

/// Shared state between the producer and the consumer.
///
/// Allocated once; never resized.
#[derive(Debug)]
pub struct MixRing {
    /// Sample storage. Atomic cells let both threads share the slice without
    /// `unsafe`; the cursors carry the real synchronisation.
    samples: Box<[AtomicI16]>,
    /// Advanced only by the consumer
    reader_cursor: AtomicUsize,
    /// Advanced only by the producer
    generator_cursor: AtomicUsize,
    /// Underrun counters bumped by the consumer
    stats: CallbackStats,
}

impl MixRing {
    /// Allocate a ring of `capacity` samples.
    ///
    /// # Panics
    /// If `capacity < 2` (a ring that can hold nothing).
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring capacity must be at least 2");
        Self {
            samples: (0..capacity).map(|_| AtomicI16::new(0)).collect(),
            reader_cursor: AtomicUsize::new(0),
            generator_cursor: AtomicUsize::new(0),
            stats: CallbackStats::default(),
        }
    }

    /// Split into the producer and consumer ends.
    ///
    /// Neither end is `Clone`, which keeps one writer per cursor.
    pub fn split(self) -> (RingWriter, RingReader) {
        let ring = Arc::new(self);
        (
            RingWriter {
                ring: Arc::clone(&ring),
            },
            RingReader { ring },
        )
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn reader_cursor(&self) -> usize {
        self.reader_cursor.load(Ordering::Acquire)
    }

    pub fn generator_cursor(&self) -> usize {
        self.generator_cursor.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> &CallbackStats {
        &self.stats
    }

    /// Circular distance from `from` forward to `to`.
    #[inline]
    fn distance(&self, from: usize, to: usize) -> usize {
        let capacity = self.samples.len();
        (to + capacity - from) % capacity
    }

    /// Split `len` samples starting at `start` into the run up to the end of
    /// the storage and the run that wraps to offset 0.
    #[inline]
    fn runs(&self, start: usize, len: usize) -> (usize, usize) {
        let first = len.min(self.samples.len() - start);
        (first, len - first)
    }
}

/// Producer end, owned by the mixer on the game thread
#[derive(Debug)]
pub struct RingWriter {
    ring: Arc<MixRing>,
}

impl RingWriter {
    /// Unread samples currently ahead of the consumer.
    pub fn buffered(&self) -> usize {
        // Our own cursor only changes through `&mut self`
        let generated = self.ring.generator_cursor.load(Ordering::Relaxed);
        let read = self.ring.reader_cursor.load(Ordering::Acquire);
        self.ring.distance(read, generated)
    }

    /// Samples that can be written without touching unread data.
    pub fn free_space(&self) -> usize {
        self.ring.capacity() - 1 - self.buffered()
    }

    /// Append samples and publish them to the consumer.
    ///
    /// Writes at most [`free_space`](Self::free_space) samples and returns how
    /// many were written. The cursor store is the last operation.
    pub fn write(&mut self, data: &[i16]) -> usize {
        let count = data.len().min(self.free_space());
        if count == 0 {
            return 0;
        }

        let start = self.ring.generator_cursor.load(Ordering::Relaxed);
        let (first, second) = self.ring.runs(start, count);
        let samples = &self.ring.samples;
        for (cell, &sample) in samples[start..start + first].iter().zip(&data[..first]) {
            cell.store(sample, Ordering::Relaxed);
        }
        for (cell, &sample) in samples[..second].iter().zip(&data[first..count]) {
            cell.store(sample, Ordering::Relaxed);
        }

        let next = (start + count) % self.ring.capacity();
        self.ring.generator_cursor.store(next, Ordering::Release);
        count
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn ring(&self) -> &MixRing {
        &self.ring
    }
}

/// Consumer end, owned by the device callback
#[derive(Debug)]
pub struct RingReader {
    ring: Arc<MixRing>,
}

impl RingReader {
    /// Samples published by the producer and not yet read.
    pub fn available(&self) -> usize {
        let read = self.ring.reader_cursor.load(Ordering::Relaxed);
        let generated = self.ring.generator_cursor.load(Ordering::Acquire);
        self.ring.distance(read, generated)
    }

    /// Copy published samples into `out`, zero-filling whatever is missing.
    ///
    /// Never blocks. Returns the number of samples actually copied; the
    /// reader cursor advances by exactly that many. When nothing is
    /// available the cursor does not move and `out` is all silence.
    pub fn read_into(&mut self, out: &mut [i16]) -> usize {
        let start = self.ring.reader_cursor.load(Ordering::Relaxed);
        let generated = self.ring.generator_cursor.load(Ordering::Acquire);
        let count = out.len().min(self.ring.distance(start, generated));

        let (first, second) = self.ring.runs(start, count);
        let samples = &self.ring.samples;
        for (dst, cell) in out[..first].iter_mut().zip(&samples[start..start + first]) {
            *dst = cell.load(Ordering::Relaxed);
        }
        for (dst, cell) in out[first..count].iter_mut().zip(&samples[..second]) {
            *dst = cell.load(Ordering::Relaxed);
        }
        out[count..].fill(0);

        if count > 0 {
            let next = (start + count) % self.ring.capacity();
            self.ring.reader_cursor.store(next, Ordering::Release);
        }
        count
    }

    pub fn stats(&self) -> &CallbackStats {
        &self.ring.stats
    }

    pub fn ring(&self) -> &MixRing {
        &self.ring
    }
}
