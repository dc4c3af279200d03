//! Bounded drop-oldest frame queue between the capture and render domains.
//!
//! The capture callback runs at audio-hardware cadence, the render loop at a
//! fixed 60Hz. This buffer is the only shared mutable state crossing the two
//! timing domains: a single producer appends, a single consumer pops, and
//! when full the oldest frame is evicted so the producer never waits.

use crate::audio::frame::AudioFrame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Bounded FIFO of audio frames with drop-oldest overflow behavior.
///
/// Clones share the same underlying queue, so the capture side and the
/// driver side each hold a handle.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    inner: Arc<Mutex<VecDeque<AudioFrame>>>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl FrameBuffer {
    /// Creates a buffer holding at most `capacity` frames.
    ///
    /// A zero capacity is clamped to 1 so `push` always admits the frame it
    /// was given.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.max(1)))),
            capacity: capacity.max(1),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Appends a frame, evicting the oldest one when at capacity.
    ///
    /// Never blocks and never fails; the producer side must not be stalled
    /// by a slow consumer.
    pub fn push(&self, frame: AudioFrame) {
        let mut queue = self.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(frame);
    }

    /// Removes and returns the oldest frame, or `None` when empty.
    pub fn pop_oldest(&self) -> Option<AudioFrame> {
        self.lock().pop_front()
    }

    /// Discards all buffered frames.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of frames currently buffered.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no frames are buffered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of frames the buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of frames evicted due to overflow since creation.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AudioFrame>> {
        // A poisoned lock only means some thread panicked mid-operation;
        // the queue itself is still structurally valid.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
