//! Step timing and triggering, independent of any thread or audio device.

use super::{AudioSink, BeatTracker, Clock};
use crate::buffer::SampleBuffer;
use crate::cache::SampleCache;
use crate::config::CacheMissPolicy;
use crate::pattern::BeatPattern;
use crate::voices::DrumVoice;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How many intervals behind the scheduler may fall before it gives up on
/// catching up and re-anchors to the current time.
pub const MAX_CATCH_UP_STEPS: u32 = 8;

/// Playback state of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Reported to the step listener after every firing, whether or not anything
/// was audible on the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// Index of the step within the pattern.
    pub step: usize,
    /// Number of steps fired since `start`.
    pub tick: u64,
    /// Grid time the step was due.
    pub scheduled: Instant,
    /// When it actually fired.
    pub fired: Instant,
    pub lateness: Duration,
}

/// Callback run after each step fires.
pub type StepListener = Box<dyn FnMut(&StepEvent) + Send>;

/// A drift-compensated step sequencer.
///
/// The scheduler never sleeps. `poll` fires the pending step when its
/// deadline has passed and returns how long to wait for the next one, so the
/// same state machine runs under the `Transport` worker thread or a test
/// driving a `ManualClock`.
///
/// Deadlines are derived from an anchor rather than chained from the
/// previous firing: step `n` is due at `anchor + (n - anchor_tick) * interval`,
/// so lateness on one step shortens the next wait instead of accumulating.
///
/// # Examples
///
/// ```
/// use beatcoach::sequencer::{ManualClock, MemorySink, Scheduler, TransportState};
/// use beatcoach::{BeatPattern, DrumVoice, PatternStep, SampleCache};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let sink = MemorySink::with_clock(clock.clone());
/// let mut scheduler = Scheduler::new(clock.clone(), sink.clone(), Arc::new(SampleCache::new()), 8000);
///
/// let mut pattern = BeatPattern::empty(120.0, 4).unwrap();
/// pattern.set_step(0, PatternStep::of(&[(DrumVoice::Kick, 1.0)])).unwrap();
/// scheduler.start(pattern);
/// assert_eq!(sink.play_count(), 1);
///
/// // 120 BPM sixteenths are 125 ms apart
/// assert_eq!(scheduler.poll(), Some(Duration::from_millis(125)));
/// clock.advance(Duration::from_millis(125));
/// scheduler.poll();
/// assert_eq!(scheduler.current_step(), 2);
/// assert_eq!(scheduler.state(), TransportState::Playing);
/// ```
pub struct Scheduler<C: Clock, S: AudioSink> {
    clock: C,
    sink: S,
    cache: Arc<SampleCache>,
    sample_rate: u32,
    cache_miss: CacheMissPolicy,
    tracker: BeatTracker,
    listener: Option<StepListener>,

    pattern: Option<BeatPattern>,
    state: TransportState,
    /// Next step to fire.
    step: usize,
    /// Steps fired since `start`.
    ticks: u64,
    anchor: Instant,
    anchor_tick: u64,
    paused_remaining: Duration,
}

impl<C: Clock, S: AudioSink> Scheduler<C, S> {
    pub fn new(clock: C, sink: S, cache: Arc<SampleCache>, sample_rate: u32) -> Self {
        let anchor = clock.now();
        Self {
            clock,
            sink,
            cache,
            sample_rate,
            cache_miss: CacheMissPolicy::default(),
            tracker: BeatTracker::new(),
            listener: None,
            pattern: None,
            state: TransportState::Stopped,
            step: 0,
            ticks: 0,
            anchor,
            anchor_tick: 0,
            paused_remaining: Duration::ZERO,
        }
    }

    pub fn with_cache_miss(mut self, policy: CacheMissPolicy) -> Self {
        self.cache_miss = policy;
        self
    }

    /// Publishes positions to `tracker` instead of a private one.
    pub fn with_tracker(mut self, tracker: BeatTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn set_step_listener(&mut self, listener: impl FnMut(&StepEvent) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_step_listener(&mut self) {
        self.listener = None;
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// The step that fires next.
    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pattern(&self) -> Option<&BeatPattern> {
        self.pattern.as_ref()
    }

    pub fn tracker(&self) -> &BeatTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn cache(&self) -> &Arc<SampleCache> {
        &self.cache
    }

    /// Starts `pattern` from step 0, stopping any current playback first.
    /// Step 0 fires before this returns.
    pub fn start(&mut self, pattern: BeatPattern) {
        self.stop();
        log::info!(
            "starting {}-step pattern at {} bpm",
            pattern.len(),
            pattern.bpm()
        );
        self.pattern = Some(pattern);
        self.state = TransportState::Playing;
        self.anchor = self.clock.now();
        self.anchor_tick = 0;
        self.poll();
    }

    /// Stops playback and forgets the pattern. Nothing fires after this
    /// returns.
    pub fn stop(&mut self) {
        if self.state != TransportState::Stopped {
            log::info!("stopping after {} steps", self.ticks);
        }
        self.state = TransportState::Stopped;
        self.pattern = None;
        self.step = 0;
        self.ticks = 0;
        self.anchor_tick = 0;
        self.paused_remaining = Duration::ZERO;
        self.tracker.reset();
    }

    /// Freezes playback, remembering how far the next step is.
    pub fn pause(&mut self) {
        if self.state != TransportState::Playing {
            return;
        }
        let now = self.clock.now();
        self.paused_remaining = self.deadline(self.ticks).saturating_duration_since(now);
        self.state = TransportState::Paused;
        self.tracker.pause(now);
        log::debug!(
            "paused before step {} with {:?} remaining",
            self.step,
            self.paused_remaining
        );
    }

    /// Continues from the exact step and phase where `pause` left off.
    pub fn resume(&mut self) {
        if self.state != TransportState::Paused {
            return;
        }
        let now = self.clock.now();
        self.anchor = now + self.paused_remaining;
        self.anchor_tick = self.ticks;
        self.state = TransportState::Playing;
        self.tracker.resume(now);
        log::debug!("resumed at step {}", self.step);
    }

    /// Swaps in an edited pattern without stopping.
    ///
    /// The step index wraps into the new length. While playing or paused the
    /// interval clock restarts, so the next step is one new interval away.
    pub fn update_pattern(&mut self, pattern: BeatPattern) {
        let len = pattern.len().max(1);
        let interval = pattern.step_interval();
        self.step %= len;
        match self.state {
            TransportState::Stopped => {}
            TransportState::Playing => {
                let now = self.clock.now();
                self.anchor = now + interval;
                self.anchor_tick = self.ticks;
                self.tracker.restart(now, interval, len);
            }
            TransportState::Paused => {
                self.paused_remaining = interval;
                self.tracker.restart(self.clock.now(), interval, len);
            }
        }
        log::debug!(
            "pattern updated: {} steps at {} bpm, next step {}",
            pattern.len(),
            pattern.bpm(),
            self.step
        );
        self.pattern = Some(pattern);
    }

    /// Fires the pending step if it is due.
    ///
    /// Returns the time until the next deadline, or `None` when nothing is
    /// scheduled (stopped or paused).
    pub fn poll(&mut self) -> Option<Duration> {
        if self.state != TransportState::Playing {
            return None;
        }
        let interval = self.pattern.as_ref()?.step_interval();
        let now = self.clock.now();
        let mut due = self.deadline(self.ticks);
        if now < due {
            return Some(due - now);
        }

        if now - due >= interval * MAX_CATCH_UP_STEPS {
            log::warn!(
                "scheduler fell {:?} behind at step {}, re-anchoring",
                now - due,
                self.step
            );
            self.anchor = now;
            self.anchor_tick = self.ticks;
            due = now;
        }

        self.fire(due, now);
        Some(self.deadline(self.ticks).saturating_duration_since(now))
    }

    fn deadline(&self, tick: u64) -> Instant {
        let interval = self
            .pattern
            .as_ref()
            .map(BeatPattern::step_interval)
            .unwrap_or_default();
        let steps = u32::try_from(tick.saturating_sub(self.anchor_tick)).unwrap_or(u32::MAX);
        self.anchor + interval.saturating_mul(steps)
    }

    fn fire(&mut self, due: Instant, now: Instant) {
        let Some(pattern) = self.pattern.as_ref() else {
            return;
        };
        let step = self.step;
        let len = pattern.len().max(1);
        let interval = pattern.step_interval();
        let swing = pattern.swing_offset(step);
        let hits: Vec<(DrumVoice, f32, Duration)> = pattern
            .step(step)
            .into_iter()
            .flat_map(|s| s.audible())
            .map(|hit| {
                (hit.voice(), hit.volume() as f32, swing + hit.offset())
            })
            .collect();

        let lateness = now - due;
        log::trace!("step {} fired {:?} late", step, lateness);

        if !hits.is_empty() && self.sink_ready() {
            for (voice, gain, offset) in hits {
                // Offsets are relative to the grid, the sink's to now
                let start = (due + offset).saturating_duration_since(now);
                self.trigger(voice, gain, start);
            }
        }

        self.tracker.publish_step(step, due, interval);
        let event = StepEvent {
            step,
            tick: self.ticks,
            scheduled: due,
            fired: now,
            lateness,
        };
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }

        self.ticks += 1;
        self.step = (step + 1) % len;
    }

    fn sink_ready(&mut self) -> bool {
        if self.sink.is_ready() {
            return true;
        }
        match self.sink.resume() {
            Ok(()) => self.sink.is_ready(),
            Err(e) => {
                log::debug!("audio output suspended, skipping step {}: {}", self.step, e);
                false
            }
        }
    }

    fn trigger(&mut self, voice: DrumVoice, gain: f32, offset: Duration) {
        let Some(buffer) = self.buffer_for(voice) else {
            return;
        };
        if let Err(e) = self.sink.play(buffer, gain, offset) {
            log::warn!("failed to play {}: {}", voice, e);
        }
    }

    fn buffer_for(&self, voice: DrumVoice) -> Option<Arc<SampleBuffer>> {
        let velocity = self.cache.top_layer();
        if let Some(buffer) = self.cache.get(voice, velocity, self.sample_rate) {
            return Some(buffer);
        }
        match self.cache_miss {
            CacheMissPolicy::SynthesizeNow => {
                log::warn!(
                    "{} at velocity {} was not pregenerated, synthesizing on the playback path",
                    voice,
                    velocity
                );
                self.cache
                    .fill(voice, u32::from(velocity), self.sample_rate)
                    .map_err(|e| log::error!("cannot synthesize {}: {}", voice, e))
                    .ok()
            }
            CacheMissPolicy::Skip => {
                log::warn!("{} at velocity {} not cached, skipping", voice, velocity);
                None
            }
        }
    }
}
