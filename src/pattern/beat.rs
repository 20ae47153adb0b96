//! A looping drum pattern with tempo, meter and swing.

use super::{DrumHit, PatternStep};
use crate::error::PatternError;
use crate::voices::DrumVoice;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Steps per quarter-note beat: every step is a sixteenth.
pub const STEPS_PER_BEAT: u32 = 4;

/// Longest pattern accepted.
pub const MAX_STEPS: usize = 256;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;

/// Fraction of a step interval that full (100%) swing delays odd steps by.
pub const SWING_DEPTH: f64 = 0.3;

/// Musical meter, serialized as `[numerator, denominator]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature(pub u8, pub u8);

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature(4, 4);

    /// # Errors
    ///
    /// `InvalidTimeSignature` unless the numerator is in 1..=32 and the
    /// denominator is a power of two up to 32.
    pub fn new(numerator: u8, denominator: u8) -> Result<Self, PatternError> {
        let signature = Self(numerator, denominator);
        if signature.is_valid() {
            Ok(signature)
        } else {
            Err(PatternError::InvalidTimeSignature(numerator, denominator))
        }
    }

    pub fn is_valid(&self) -> bool {
        (1..=32).contains(&self.0) && self.1.is_power_of_two() && self.1 <= 32
    }

    pub fn numerator(&self) -> u8 {
        self.0
    }

    pub fn denominator(&self) -> u8 {
        self.1
    }

    /// Sixteenth-note steps in one bar (at least one).
    pub fn steps_per_bar(&self) -> usize {
        let sixteenths = usize::from(self.0) * 16 / usize::from(self.1.max(1));
        sixteenths.max(1)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// A step grid played in a loop.
///
/// The number of steps only changes through `resize`. A running scheduler
/// picks up edits through `Scheduler::update_pattern`.
///
/// # Examples
///
/// ```
/// use beatcoach::{BeatPattern, DrumVoice, PatternStep};
/// use std::time::Duration;
///
/// let pattern = BeatPattern::new(
///     120.0,
///     vec![
///         PatternStep::of(&[(DrumVoice::Kick, 1.0)]),
///         PatternStep::of(&[(DrumVoice::Hihat, 0.6)]),
///         PatternStep::of(&[(DrumVoice::Snare, 0.8)]),
///         PatternStep::of(&[(DrumVoice::Hihat, 0.6)]),
///     ],
/// )
/// .unwrap()
/// .with_swing(50.0);
///
/// assert_eq!(pattern.step_interval(), Duration::from_millis(125));
/// assert_eq!(pattern.swing_offset(0), Duration::ZERO);
/// assert!(pattern.swing_offset(1) > Duration::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BeatPattern {
    bpm: f64,
    steps: Vec<PatternStep>,
    time_signature: TimeSignature,
    swing_percent: f64,
}

impl BeatPattern {
    /// # Errors
    ///
    /// `InvalidBpm` outside 20..=300, `EmptyPattern` without steps,
    /// `TooManySteps` beyond `MAX_STEPS`.
    pub fn new(bpm: f64, steps: Vec<PatternStep>) -> Result<Self, PatternError> {
        validate_bpm(bpm)?;
        validate_len(steps.len())?;
        Ok(Self {
            bpm,
            steps,
            time_signature: TimeSignature::COMMON,
            swing_percent: 0.0,
        })
    }

    /// A pattern of `len` rests.
    pub fn empty(bpm: f64, len: usize) -> Result<Self, PatternError> {
        Self::new(bpm, vec![PatternStep::rest(); len])
    }

    /// Swing in percent, clamped to [0, 100].
    pub fn with_swing(mut self, percent: f64) -> Self {
        self.set_swing(percent);
        self
    }

    pub fn with_time_signature(mut self, signature: TimeSignature) -> Self {
        self.time_signature = signature;
        self
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn steps(&self) -> &[PatternStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&PatternStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: a pattern has at least one step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn swing_percent(&self) -> f64 {
        self.swing_percent
    }

    /// Time between two steps: `60 / bpm / 4` seconds.
    pub fn step_interval(&self) -> Duration {
        step_interval_for(self.bpm)
    }

    /// How late the audio of `step` sounds relative to the even grid.
    ///
    /// Only odd steps swing, by `swing / 100 * interval * 0.3`.
    pub fn swing_offset(&self, step: usize) -> Duration {
        if step % 2 == 0 || self.swing_percent <= 0.0 {
            return Duration::ZERO;
        }
        self.step_interval()
            .mul_f64(self.swing_percent / 100.0 * SWING_DEPTH)
    }

    /// Length of one pass through every step.
    pub fn loop_duration(&self) -> Duration {
        self.step_interval() * self.steps.len() as u32
    }

    pub fn set_bpm(&mut self, bpm: f64) -> Result<(), PatternError> {
        validate_bpm(bpm)?;
        self.bpm = bpm;
        Ok(())
    }

    pub fn set_swing(&mut self, percent: f64) {
        self.swing_percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
    }

    pub fn set_time_signature(&mut self, signature: TimeSignature) {
        self.time_signature = signature;
    }

    /// Adds or removes a voice on a step. Returns whether the voice is now
    /// present.
    pub fn toggle(&mut self, step: usize, voice: DrumVoice, volume: f64) -> Result<bool, PatternError> {
        Ok(self.step_mut(step)?.toggle(voice, volume))
    }

    /// Sets a voice's volume on a step, adding the voice if it is absent.
    pub fn set_volume(&mut self, step: usize, voice: DrumVoice, volume: f64) -> Result<(), PatternError> {
        let step = self.step_mut(step)?;
        let hit = match step.hit(voice) {
            Some(existing) => existing.with_volume(volume),
            None => DrumHit::new(voice, volume),
        };
        step.insert(hit);
        Ok(())
    }

    /// Moves a voice on a step off the grid by `seconds`. Returns whether the
    /// voice was on the step.
    pub fn set_offset(&mut self, step: usize, voice: DrumVoice, seconds: f64) -> Result<bool, PatternError> {
        Ok(self.step_mut(step)?.set_offset(voice, seconds))
    }

    pub fn set_step(&mut self, index: usize, step: PatternStep) -> Result<(), PatternError> {
        *self.step_mut(index)? = step;
        Ok(())
    }

    pub fn clear_step(&mut self, step: usize) -> Result<(), PatternError> {
        self.step_mut(step)?.clear();
        Ok(())
    }

    /// Changes the step count, padding with rests or dropping trailing steps.
    pub fn resize(&mut self, len: usize) -> Result<(), PatternError> {
        validate_len(len)?;
        self.steps.resize(len, PatternStep::rest());
        Ok(())
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut PatternStep, PatternError> {
        let len = self.steps.len();
        self.steps
            .get_mut(index)
            .ok_or(PatternError::StepOutOfRange { step: index, len })
    }
}

/// Step interval for a tempo, with four steps per beat.
pub fn step_interval_for(bpm: f64) -> Duration {
    Duration::from_secs_f64(60.0 / bpm / f64::from(STEPS_PER_BEAT))
}

fn validate_bpm(bpm: f64) -> Result<(), PatternError> {
    if bpm.is_finite() && (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(())
    } else {
        Err(PatternError::InvalidBpm(bpm))
    }
}

fn validate_len(len: usize) -> Result<(), PatternError> {
    match len {
        0 => Err(PatternError::EmptyPattern),
        n if n > MAX_STEPS => Err(PatternError::TooManySteps(n)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_on_floor() -> BeatPattern {
        let mut pattern = BeatPattern::empty(120.0, 16).unwrap();
        for step in (0..16).step_by(4) {
            pattern.toggle(step, DrumVoice::Kick, 1.0).unwrap();
        }
        pattern
    }

    #[test]
    fn test_validation() {
        assert!(matches!(BeatPattern::empty(19.9, 4), Err(PatternError::InvalidBpm(_))));
        assert!(matches!(BeatPattern::empty(f64::NAN, 4), Err(PatternError::InvalidBpm(_))));
        assert!(matches!(BeatPattern::empty(120.0, 0), Err(PatternError::EmptyPattern)));
        assert!(matches!(
            BeatPattern::empty(120.0, MAX_STEPS + 1),
            Err(PatternError::TooManySteps(257))
        ));
        assert!(BeatPattern::empty(300.0, MAX_STEPS).is_ok());
    }

    #[test]
    fn test_step_interval() {
        let pattern = BeatPattern::empty(120.0, 4).unwrap();
        assert_eq!(pattern.step_interval(), Duration::from_millis(125));
        assert_eq!(pattern.loop_duration(), Duration::from_millis(500));

        let slow = BeatPattern::empty(60.0, 4).unwrap();
        assert_eq!(slow.step_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_swing_only_on_odd_steps() {
        let pattern = BeatPattern::empty(120.0, 8).unwrap().with_swing(50.0);
        // 50% of 30% of 125 ms
        let expected = Duration::from_secs_f64(0.125 * 0.5 * 0.3);
        for step in 0..8 {
            let offset = pattern.swing_offset(step);
            if step % 2 == 0 {
                assert_eq!(offset, Duration::ZERO);
            } else {
                assert!(offset.abs_diff(expected) < Duration::from_micros(1));
            }
        }
    }

    #[test]
    fn test_swing_clamped() {
        let pattern = BeatPattern::empty(120.0, 4).unwrap().with_swing(250.0);
        assert_eq!(pattern.swing_percent(), 100.0);
        let pattern = pattern.with_swing(-3.0);
        assert_eq!(pattern.swing_percent(), 0.0);
    }

    #[test]
    fn test_editing() {
        let mut pattern = four_on_floor();
        assert_eq!(pattern.step(4).unwrap().len(), 1);

        pattern.set_volume(4, DrumVoice::Kick, 0.5).unwrap();
        assert_eq!(pattern.step(4).unwrap().hit(DrumVoice::Kick).unwrap().volume(), 0.5);

        pattern.set_volume(5, DrumVoice::Snare, 0.9).unwrap();
        assert!(pattern.step(5).unwrap().hit(DrumVoice::Snare).is_some());

        pattern.clear_step(4).unwrap();
        assert!(pattern.step(4).unwrap().is_rest());

        assert!(matches!(
            pattern.toggle(16, DrumVoice::Kick, 1.0),
            Err(PatternError::StepOutOfRange { step: 16, len: 16 })
        ));
    }

    #[test]
    fn test_resize_pads_and_truncates() {
        let mut pattern = four_on_floor();
        pattern.resize(20).unwrap();
        assert_eq!(pattern.len(), 20);
        assert!(pattern.step(19).unwrap().is_rest());

        pattern.resize(3).unwrap();
        assert_eq!(pattern.len(), 3);
        assert!(pattern.step(0).unwrap().hit(DrumVoice::Kick).is_some());

        assert!(matches!(pattern.resize(0), Err(PatternError::EmptyPattern)));
        assert_eq!(pattern.len(), 3);
    }

    #[test]
    fn test_time_signature() {
        assert_eq!(TimeSignature::COMMON.steps_per_bar(), 16);
        assert_eq!(TimeSignature::new(3, 4).unwrap().steps_per_bar(), 12);
        assert_eq!(TimeSignature::new(6, 8).unwrap().steps_per_bar(), 12);
        assert!(TimeSignature::new(4, 3).is_err());
        assert!(TimeSignature::new(0, 4).is_err());
        assert_eq!(TimeSignature(7, 8).to_string(), "7/8");
        assert_eq!(serde_json::to_string(&TimeSignature(3, 4)).unwrap(), "[3,4]");
    }
}
