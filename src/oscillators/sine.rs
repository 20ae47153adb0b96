//! Sine wave oscillator.

use super::Oscillator;
use crate::Signal;
use std::f64::consts::TAU;

/// A phase-accumulating sine oscillator.
///
/// # Examples
///
/// ```
/// use beatcoach::{Oscillator, Signal, SineOscillator};
///
/// let mut osc = SineOscillator::new(440.0, 44100.0);
/// let first = osc.next_sample();
/// assert!(first.abs() < 1e-12);
///
/// // Pitch sweeps keep phase continuity
/// osc.set_frequency(220.0);
/// assert_eq!(osc.frequency(), 220.0);
/// ```
#[derive(Debug, Clone)]
pub struct SineOscillator {
    /// Current phase (0.0 to 1.0)
    phase: f64,
    /// Phase increment per sample (frequency / sample_rate)
    phase_increment: f64,
    sample_rate: f64,
}

impl SineOscillator {
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        Self {
            phase: 0.0,
            phase_increment: frequency / sample_rate,
            sample_rate,
        }
    }

    /// Current phase in cycles, in [0, 1).
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl Signal for SineOscillator {
    fn next_sample(&mut self) -> f64 {
        let sample = (self.phase * TAU).sin();

        self.phase += self.phase_increment;
        self.phase -= self.phase.floor();

        sample
    }
}

impl Oscillator for SineOscillator {
    fn set_frequency(&mut self, frequency: f64) {
        self.phase_increment = frequency / self.sample_rate;
    }

    fn frequency(&self) -> f64 {
        self.phase_increment * self.sample_rate
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_change() {
        let mut osc = SineOscillator::new(440.0, 44100.0);
        osc.set_frequency(880.0);
        assert_eq!(osc.frequency(), 880.0);
    }

    #[test]
    fn test_sample_range() {
        let mut osc = SineOscillator::new(440.0, 44100.0);
        for _ in 0..44100 {
            let sample = osc.next_sample();
            assert!((-1.0..=1.0).contains(&sample));
        }
    }

    #[test]
    fn test_quarter_cycle() {
        // 1 Hz at 4 samples/sec hits 0, 1, 0, -1
        let mut osc = SineOscillator::new(1.0, 4.0);
        let samples = osc.take_samples(4);
        assert!(samples[0].abs() < 1e-12);
        assert!((samples[1] - 1.0).abs() < 1e-12);
        assert!(samples[2].abs() < 1e-12);
        assert!((samples[3] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_phase_wrapping() {
        let mut osc = SineOscillator::new(1000.0, 44100.0);
        for _ in 0..100000 {
            osc.next_sample();
        }
        assert!(osc.phase() >= 0.0 && osc.phase() < 1.0);
    }

    #[test]
    fn test_reset() {
        let mut osc = SineOscillator::new(440.0, 44100.0);
        osc.take_samples(100);
        osc.reset();
        assert_eq!(osc.phase(), 0.0);
    }

    #[test]
    fn test_zero_frequency() {
        let mut osc = SineOscillator::new(0.0, 44100.0);
        assert_eq!(osc.next_sample(), osc.next_sample());
    }
}
