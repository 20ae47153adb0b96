//! The boundary between the scheduler and whatever produces sound.

use super::{Clock, SystemClock};
use crate::buffer::SampleBuffer;
use crate::error::SinkError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Plays finished buffers.
///
/// `play` must support starting a buffer `offset` into the future with
/// sample accuracy; the scheduler relies on it for swing and per-hit offsets.
pub trait AudioSink: Send {
    /// Whether the output is running. A suspended output is a normal state.
    fn is_ready(&self) -> bool {
        true
    }

    /// Attempts to bring a suspended output back.
    fn resume(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn play(&mut self, buffer: Arc<SampleBuffer>, gain: f32, offset: Duration) -> Result<(), SinkError>;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn resume(&mut self) -> Result<(), SinkError> {
        (**self).resume()
    }

    fn play(&mut self, buffer: Arc<SampleBuffer>, gain: f32, offset: Duration) -> Result<(), SinkError> {
        (**self).play(buffer, gain, offset)
    }
}

/// One `play` call recorded by a `MemorySink`.
#[derive(Debug, Clone)]
pub struct PlayedHit {
    pub buffer: Arc<SampleBuffer>,
    pub gain: f32,
    pub offset: Duration,
    /// When `play` was called.
    pub requested_at: Instant,
}

impl PlayedHit {
    /// When the buffer starts sounding.
    pub fn starts_at(&self) -> Instant {
        self.requested_at + self.offset
    }
}

/// A sink that records every trigger instead of playing it.
///
/// Clones share the same record and readiness, so a test can keep a handle
/// after moving the sink into a scheduler.
#[derive(Debug, Clone)]
pub struct MemorySink<C: Clock = SystemClock> {
    clock: C,
    played: Arc<Mutex<Vec<PlayedHit>>>,
    ready: Arc<AtomicBool>,
    resumable: Arc<AtomicBool>,
}

impl MemorySink<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemorySink<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemorySink<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            played: Arc::new(Mutex::new(Vec::new())),
            ready: Arc::new(AtomicBool::new(true)),
            resumable: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulates a suspended output. `resumable` controls whether `resume`
    /// succeeds.
    pub fn suspend(&self, resumable: bool) {
        self.ready.store(false, Ordering::SeqCst);
        self.resumable.store(resumable, Ordering::SeqCst);
    }

    pub fn played(&self) -> Vec<PlayedHit> {
        self.played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear(&self) {
        self.played.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl<C: Clock> AudioSink for MemorySink<C> {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn resume(&mut self) -> Result<(), SinkError> {
        if self.resumable.load(Ordering::SeqCst) {
            self.ready.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(SinkError::NotReady)
        }
    }

    fn play(&mut self, buffer: Arc<SampleBuffer>, gain: f32, offset: Duration) -> Result<(), SinkError> {
        if !self.is_ready() {
            return Err(SinkError::NotReady);
        }
        let hit = PlayedHit {
            buffer,
            gain,
            offset,
            requested_at: self.clock.now(),
        };
        self.played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hit);
        Ok(())
    }
}
