//! Per-frame exercise scoring and the loop that paces it.

use super::Pose;
use crate::sequencer::{BeatPosition, BeatTracker};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Result of scoring one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// A full repetition was recognized on this frame.
    pub is_completed: bool,
    /// How closely the pose matches the target, in [0, 1].
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Detection {
    /// Non-finite accuracy counts as 0; anything else is clamped to [0, 1].
    pub fn new(is_completed: bool, accuracy: f64) -> Self {
        Self {
            is_completed,
            accuracy: unit(accuracy),
            confidence: None,
            feedback: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(unit(confidence));
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Scores poses for one exercise.
///
/// Implementations keep whatever state they need between frames (rep
/// counters, phase flags) and clear it in `reset`. Beat-synchronized
/// detectors compare the pose against the guide frame for `beat`; `beat`
/// is `None` while playback is stopped.
pub trait Detector: Send {
    fn detect(
        &mut self,
        current: &Pose,
        previous: Option<&Pose>,
        beat: Option<BeatPosition>,
    ) -> Detection;

    fn reset(&mut self);
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(
        &mut self,
        current: &Pose,
        previous: Option<&Pose>,
        beat: Option<BeatPosition>,
    ) -> Detection {
        (**self).detect(current, previous, beat)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Rate limiter for pose inference.
///
/// A frame is processed only if it is the `frame_stride`-th frame since the
/// last processed one and at least `min_interval` has passed.
#[derive(Debug, Clone)]
pub struct DetectionThrottle {
    frame_stride: u32,
    min_interval: Duration,
    frames_skipped: u32,
    last_run: Option<Instant>,
}

impl DetectionThrottle {
    pub fn new(frame_stride: u32, min_interval: Duration) -> Self {
        Self {
            frame_stride: frame_stride.max(1),
            min_interval,
            frames_skipped: 0,
            last_run: None,
        }
    }

    /// Runs on every frame.
    pub fn unthrottled() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Counts a frame arriving at `now` and decides whether to process it.
    pub fn should_run(&mut self, now: Instant) -> bool {
        self.frames_skipped += 1;
        if self.frames_skipped < self.frame_stride {
            return false;
        }
        if let Some(last) = self.last_run {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.frames_skipped = 0;
        self.last_run = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.frames_skipped = 0;
        self.last_run = None;
    }
}

impl Default for DetectionThrottle {
    /// Every other frame, at most ten times a second.
    fn default() -> Self {
        Self::new(2, Duration::from_millis(100))
    }
}

/// Feeds camera frames through a throttle into a detector, tagging each
/// with the current beat position.
///
/// # Examples
///
/// ```
/// use beatcoach::detection::{Detection, DetectionLoop, DetectionThrottle, Detector, Keypoint, Pose};
/// use beatcoach::sequencer::{BeatPosition, BeatTracker};
/// use std::time::Instant;
///
/// struct AlwaysGood;
///
/// impl Detector for AlwaysGood {
///     fn detect(&mut self, _: &Pose, _: Option<&Pose>, _: Option<BeatPosition>) -> Detection {
///         Detection::new(false, 1.0)
///     }
///     fn reset(&mut self) {}
/// }
///
/// let mut detection = DetectionLoop::new(AlwaysGood, BeatTracker::new())
///     .with_throttle(DetectionThrottle::unthrottled());
/// let pose = Pose::new([Keypoint::default(); 33]);
/// assert_eq!(detection.on_frame(pose, Instant::now()).unwrap().accuracy, 1.0);
/// ```
pub struct DetectionLoop<D: Detector> {
    detector: D,
    throttle: DetectionThrottle,
    tracker: BeatTracker,
    previous: Option<Pose>,
    completed: u32,
}

impl<D: Detector> DetectionLoop<D> {
    pub fn new(detector: D, tracker: BeatTracker) -> Self {
        Self {
            detector,
            throttle: DetectionThrottle::default(),
            tracker,
            previous: None,
            completed: 0,
        }
    }

    pub fn with_throttle(mut self, throttle: DetectionThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Handles one camera frame. Returns `None` when the throttle skips it.
    pub fn on_frame(&mut self, pose: Pose, now: Instant) -> Option<Detection> {
        if !self.throttle.should_run(now) {
            return None;
        }
        let beat = self.tracker.position_at(now);
        let detection = self.detector.detect(&pose, self.previous.as_ref(), beat);
        if detection.is_completed {
            self.completed += 1;
            log::debug!("repetition {} completed", self.completed);
        }
        self.previous = Some(pose);
        Some(detection)
    }

    /// Repetitions completed since the last reset.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn reset(&mut self) {
        self.detector.reset();
        self.throttle.reset();
        self.previous = None;
        self.completed = 0;
    }
}
