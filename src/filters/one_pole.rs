//! First-order low-pass/high-pass section.

use std::f64::consts::TAU;

/// A one-pole low-pass filter with a complementary high-pass output.
///
/// The high-pass output is `input - lowpass`, so the two bands always sum back
/// to the input exactly. The equalizer relies on that to derive its mid band
/// as a residual.
///
/// # Examples
///
/// ```
/// use beatcoach::filters::OnePole;
///
/// let mut lp = OnePole::new(200.0, 44100.0);
/// let low = lp.lowpass(1.0);
/// assert!(low > 0.0 && low < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct OnePole {
    coefficient: f64,
    state: f64,
}

impl OnePole {
    /// Creates a filter with the given cutoff in Hz.
    ///
    /// The cutoff is clamped to (0, 0.49 * sample_rate).
    pub fn new(cutoff: f64, sample_rate: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be greater than 0");
        let cutoff = cutoff.clamp(1.0, sample_rate * 0.49);
        Self {
            coefficient: 1.0 - (-TAU * cutoff / sample_rate).exp(),
            state: 0.0,
        }
    }

    /// Filters one sample and returns the low-passed value.
    pub fn lowpass(&mut self, input: f64) -> f64 {
        self.state += self.coefficient * (input - self.state);
        self.state
    }

    /// Filters one sample and returns the high-passed value.
    pub fn highpass(&mut self, input: f64) -> f64 {
        input - self.lowpass(input)
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowpass_settles_on_dc() {
        let mut lp = OnePole::new(100.0, 44100.0);
        let mut out = 0.0;
        for _ in 0..44100 {
            out = lp.lowpass(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut hp = OnePole::new(100.0, 44100.0);
        let mut out = 1.0;
        for _ in 0..44100 {
            out = hp.highpass(1.0);
        }
        assert!(out.abs() < 1e-6);
    }

    #[test]
    fn test_bands_sum_to_input() {
        let mut a = OnePole::new(500.0, 44100.0);
        let mut b = OnePole::new(500.0, 44100.0);
        for i in 0..100 {
            let x = (i as f64 * 0.37).sin();
            let sum = a.lowpass(x) + b.highpass(x);
            assert!((sum - x).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reset() {
        let mut lp = OnePole::new(100.0, 44100.0);
        lp.lowpass(1.0);
        lp.reset();
        assert_eq!(lp.lowpass(0.0), 0.0);
    }

    #[test]
    #[should_panic(expected = "sample_rate must be greater than 0")]
    fn test_invalid_sample_rate() {
        OnePole::new(100.0, 0.0);
    }
}
