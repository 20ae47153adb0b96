//! The sequencer position published for beat-synchronized consumers.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Where playback is within the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BeatPosition {
    /// Index of the step that fired most recently.
    pub step: usize,
    /// Fraction of the step interval elapsed since it fired, in [0, 1).
    pub progress: f64,
}

#[derive(Debug, Default)]
struct Snapshot {
    step: usize,
    step_started: Option<Instant>,
    interval: Duration,
    /// Progress frozen by a pause.
    paused_at: Option<f64>,
}

/// Shared, read-mostly view of the last fired step.
///
/// The scheduler writes it on every firing; any number of readers (the
/// detection loop, a UI) may read it from other threads. Readers may see a
/// position that is one step stale, which is fine at human reaction times.
#[derive(Debug, Clone, Default)]
pub struct BeatTracker {
    snapshot: Arc<RwLock<Snapshot>>,
}

/// Largest progress value reported, keeping progress strictly below 1.
const MAX_PROGRESS: f64 = 1.0 - 1e-9;

impl BeatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position at `now`, or `None` while stopped.
    pub fn position_at(&self, now: Instant) -> Option<BeatPosition> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        let started = snapshot.step_started?;
        let progress = match snapshot.paused_at {
            Some(progress) => progress,
            None => progress_between(started, now, snapshot.interval),
        };
        Some(BeatPosition {
            step: snapshot.step,
            progress,
        })
    }

    pub fn position(&self) -> Option<BeatPosition> {
        self.position_at(Instant::now())
    }

    pub fn is_active(&self) -> bool {
        self.read(|s| s.step_started.is_some())
    }

    pub(crate) fn publish_step(&self, step: usize, at: Instant, interval: Duration) {
        self.write(|s| {
            s.step = step;
            s.step_started = Some(at);
            s.interval = interval;
            s.paused_at = None;
        });
    }

    /// Restarts the current step's phase after a live pattern change.
    pub(crate) fn restart(&self, now: Instant, interval: Duration, len: usize) {
        self.write(|s| {
            if s.step_started.is_none() {
                return;
            }
            s.step %= len.max(1);
            s.interval = interval;
            if s.paused_at.is_some() {
                s.paused_at = Some(0.0);
            } else {
                s.step_started = Some(now);
            }
        });
    }

    pub(crate) fn pause(&self, now: Instant) {
        self.write(|s| {
            if let Some(started) = s.step_started {
                s.paused_at = Some(progress_between(started, now, s.interval));
            }
        });
    }

    /// Continues from the frozen progress as if the pause never happened.
    pub(crate) fn resume(&self, now: Instant) {
        self.write(|s| {
            if let Some(progress) = s.paused_at.take() {
                let done = s.interval.mul_f64(progress);
                s.step_started = Some(now.checked_sub(done).unwrap_or(now));
            }
        });
    }

    pub(crate) fn reset(&self) {
        self.write(|s| *s = Snapshot::default());
    }

    fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        f(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self, f: impl FnOnce(&mut Snapshot)) {
        f(&mut self.snapshot.write().unwrap_or_else(PoisonError::into_inner));
    }
}

fn progress_between(started: Instant, now: Instant, interval: Duration) -> f64 {
    if interval.is_zero() {
        return 0.0;
    }
    let elapsed = now.saturating_duration_since(started);
    (elapsed.as_secs_f64() / interval.as_secs_f64()).clamp(0.0, MAX_PROGRESS)
}
