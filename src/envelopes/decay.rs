//! Exponential decay envelope.

use crate::Signal;

/// An exponential decay `e^(-rate * t)` starting at 1.0.
///
/// Computed recursively (one multiply per sample) so long tails stay cheap.
/// The output is identical for identical inputs, which keeps synthesized
/// buffers reproducible.
///
/// # Examples
///
/// ```
/// use beatcoach::{ExpDecay, Signal};
///
/// let mut decay = ExpDecay::new(10.0, 44100.0);
/// assert_eq!(decay.next_sample(), 1.0);
/// assert!(decay.next_sample() < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct ExpDecay {
    level: f64,
    factor: f64,
}

impl ExpDecay {
    /// Creates a decay falling by a factor of `e` every `1 / rate` seconds.
    pub fn new(rate: f64, sample_rate: f64) -> Self {
        let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
        Self {
            level: 1.0,
            factor: (-rate / sample_rate).exp(),
        }
    }

    /// Creates a decay that reaches `floor` (e.g. 0.001 for -60 dB) after
    /// `seconds`.
    pub fn reaching(floor: f64, seconds: f64, sample_rate: f64) -> Self {
        let floor = floor.clamp(1e-9, 1.0);
        let seconds = seconds.max(1e-6);
        Self::new(-floor.ln() / seconds, sample_rate)
    }

    /// Current level without advancing.
    pub fn level(&self) -> f64 {
        self.level
    }
}

impl Signal for ExpDecay {
    fn next_sample(&mut self) -> f64 {
        let out = self.level;
        self.level *= self.factor;
        out
    }
}
