//! One-shot ADSR envelope for percussive hits.

use super::Curve;
use crate::Signal;

/// Stage of the ADSR envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR (Attack, Decay, Sustain, Release) envelope.
///
/// Drum hits have no key to release, so the envelope is usually given a hold
/// time: after `hold` seconds from the trigger it enters its release stage on
/// its own. Without a hold it behaves like a classic gated ADSR driven by
/// `note_on`/`note_off`.
///
/// # Examples
///
/// ```
/// use beatcoach::{Adsr, Curve, Signal};
///
/// // 1 ms attack, 20 ms decay to 30%, released 50 ms after the hit
/// let mut env = Adsr::new(0.001, 0.02, 0.3, 0.05, 44100.0)
///     .with_hold(0.05)
///     .with_release_curve(Curve::Exponential(2.0));
/// env.note_on();
///
/// let levels = env.take_samples(44100 / 5);
/// assert_eq!(*levels.last().unwrap(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Adsr {
    stage: Stage,
    position: f64,
    elapsed: f64,
    level: f64,
    release_start_level: f64,

    attack_time: f64,
    decay_time: f64,
    sustain_level: f64,
    release_time: f64,
    hold_time: Option<f64>,

    attack_curve: Curve,
    decay_curve: Curve,
    release_curve: Curve,

    sample_rate: f64,
}

impl Adsr {
    /// Creates a new envelope with linear curves.
    ///
    /// Negative times are treated as zero and the sustain level is clamped to
    /// [0, 1].
    pub fn new(
        attack_time: f64,
        decay_time: f64,
        sustain_level: f64,
        release_time: f64,
        sample_rate: f64,
    ) -> Self {
        Self {
            stage: Stage::Idle,
            position: 0.0,
            elapsed: 0.0,
            level: 0.0,
            release_start_level: 0.0,
            attack_time: attack_time.max(0.0),
            decay_time: decay_time.max(0.0),
            sustain_level: sustain_level.clamp(0.0, 1.0),
            release_time: release_time.max(0.0),
            hold_time: None,
            attack_curve: Curve::Linear,
            decay_curve: Curve::Linear,
            release_curve: Curve::Linear,
            sample_rate,
        }
    }

    /// Releases automatically `seconds` after `note_on`.
    pub fn with_hold(mut self, seconds: f64) -> Self {
        self.hold_time = Some(seconds.max(0.0));
        self
    }

    pub fn with_attack_curve(mut self, curve: Curve) -> Self {
        self.attack_curve = curve;
        self
    }

    pub fn with_decay_curve(mut self, curve: Curve) -> Self {
        self.decay_curve = curve;
        self
    }

    pub fn with_release_curve(mut self, curve: Curve) -> Self {
        self.release_curve = curve;
        self
    }

    /// Triggers the envelope from the start of its attack.
    pub fn note_on(&mut self) {
        self.stage = Stage::Attack;
        self.position = 0.0;
        self.elapsed = 0.0;
    }

    /// Starts the release stage from the current level. No effect when idle.
    pub fn note_off(&mut self) {
        if self.stage != Stage::Idle && self.stage != Stage::Release {
            self.stage = Stage::Release;
            self.position = 0.0;
            self.release_start_level = self.level;
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    fn advance_stage(&mut self, stage: Stage, level: f64) -> f64 {
        self.stage = stage;
        self.position = 0.0;
        self.level = level;
        level
    }

    fn segment_progress(&self, seconds: f64) -> f64 {
        self.position / (seconds * self.sample_rate)
    }
}

impl Signal for Adsr {
    fn next_sample(&mut self) -> f64 {
        if let Some(hold) = self.hold_time {
            if self.stage != Stage::Idle && self.elapsed >= hold * self.sample_rate {
                self.note_off();
            }
        }
        if self.stage != Stage::Idle {
            self.elapsed += 1.0;
        }

        match self.stage {
            Stage::Idle => 0.0,

            Stage::Attack => {
                if self.attack_time <= 0.0 {
                    return self.advance_stage(Stage::Decay, 1.0);
                }
                let progress = self.segment_progress(self.attack_time);
                if progress >= 1.0 {
                    self.advance_stage(Stage::Decay, 1.0)
                } else {
                    self.position += 1.0;
                    self.level = self.attack_curve.apply(progress);
                    self.level
                }
            }

            Stage::Decay => {
                if self.decay_time <= 0.0 {
                    return self.advance_stage(Stage::Sustain, self.sustain_level);
                }
                let progress = self.segment_progress(self.decay_time);
                if progress >= 1.0 {
                    self.advance_stage(Stage::Sustain, self.sustain_level)
                } else {
                    self.position += 1.0;
                    let curved = self.decay_curve.apply(progress);
                    self.level = 1.0 - curved * (1.0 - self.sustain_level);
                    self.level
                }
            }

            Stage::Sustain => {
                self.level = self.sustain_level;
                self.level
            }

            Stage::Release => {
                if self.release_time <= 0.0 {
                    return self.advance_stage(Stage::Idle, 0.0);
                }
                let progress = self.segment_progress(self.release_time);
                if progress >= 1.0 {
                    self.advance_stage(Stage::Idle, 0.0)
                } else {
                    self.position += 1.0;
                    let curved = self.release_curve.apply(progress);
                    self.level = self.release_start_level * (1.0 - curved);
                    self.level
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 100.0;
    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_idle_outputs_zero() {
        let mut env = Adsr::new(0.1, 0.2, 0.7, 0.3, SAMPLE_RATE);
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn test_attack_reaches_peak() {
        let mut env = Adsr::new(1.0, 0.0, 1.0, 0.0, SAMPLE_RATE);
        env.note_on();
        let levels = env.take_samples(101);
        assert!(levels[0] < 0.02);
        assert!(approx_eq(levels[50], 0.5));
        assert!(approx_eq(levels[100], 1.0));
    }

    #[test]
    fn test_decay_to_sustain() {
        let mut env = Adsr::new(0.0, 1.0, 0.5, 0.0, SAMPLE_RATE);
        env.note_on();
        assert_eq!(env.next_sample(), 1.0);
        let levels = env.take_samples(150);
        assert!(approx_eq(*levels.last().unwrap(), 0.5));
        assert_eq!(env.stage, Stage::Sustain);
    }

    #[test]
    fn test_release_from_current_level() {
        let mut env = Adsr::new(0.0, 0.0, 0.8, 1.0, SAMPLE_RATE);
        env.note_on();
        env.take_samples(2);
        env.note_off();
        let levels = env.take_samples(101);
        assert!(approx_eq(levels[0], 0.8));
        assert!(approx_eq(levels[50], 0.4));
        assert!(approx_eq(levels[100], 0.0));
        assert!(!env.is_active());
    }

    #[test]
    fn test_hold_releases_automatically() {
        // Hold for 0.1s (10 samples), release over 0.1s
        let mut env = Adsr::new(0.0, 0.0, 1.0, 0.1, SAMPLE_RATE).with_hold(0.1);
        env.note_on();
        let levels = env.take_samples(30);
        assert!(approx_eq(levels[5], 1.0));
        assert!(levels[15] < 1.0);
        assert_eq!(levels[29], 0.0);
        assert!(!env.is_active());
    }

    #[test]
    fn test_retrigger_restarts_attack() {
        let mut env = Adsr::new(0.5, 0.1, 0.7, 0.1, SAMPLE_RATE);
        env.note_on();
        env.take_samples(25);
        env.note_on();
        assert!(env.next_sample() < 0.05);
    }

    #[test]
    fn test_negative_times_clamped() {
        let mut env = Adsr::new(-1.0, -1.0, 2.0, -1.0, SAMPLE_RATE);
        env.note_on();
        assert_eq!(env.next_sample(), 1.0);
        assert_eq!(env.next_sample(), 1.0);
    }
}
