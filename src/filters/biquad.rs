//! Biquad filter section.
//!
//! Coefficients follow Robert Bristow-Johnson's Audio EQ Cookbook.

use std::f64::consts::TAU;

/// The response of a biquad section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Attenuates frequencies above the cutoff
    LowPass,
    /// Attenuates frequencies below the cutoff
    HighPass,
    /// Passes frequencies near the center, 0 dB peak gain
    BandPass,
}

/// A second-order IIR filter processing one sample at a time.
///
/// The voices use it to carve noise: a high-pass takes the rumble out of the
/// hi-hats and a band-pass focuses the ride's noise around its bell.
///
/// # Examples
///
/// ```
/// use beatcoach::filters::{Biquad, FilterType};
///
/// let mut hp = Biquad::new(FilterType::HighPass, 7000.0, 0.707, 44100.0);
/// let out = hp.process(1.0);
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,

    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// # Arguments
    ///
    /// * `filter_type` - Response shape
    /// * `frequency` - Cutoff or center frequency in Hz (clamped below Nyquist)
    /// * `q` - Q factor, typically 0.5-10.0
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(filter_type: FilterType, frequency: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.001);
        let frequency = frequency.clamp(1.0, sample_rate * 0.49);

        let omega = TAU * frequency / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        let (b0, b1, b2) = match filter_type {
            FilterType::LowPass => {
                let b1 = 1.0 - cos_omega;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterType::HighPass => {
                let b1 = -(1.0 + cos_omega);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
            FilterType::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(FilterType::HighPass, cutoff, q, sample_rate)
    }

    pub fn bandpass(center: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(FilterType::BandPass, center, q, sample_rate)
    }

    /// Filters one sample (Direct Form I).
    pub fn process(&mut self, x0: f64) -> f64 {
        let y0 = self.b0 * x0 + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = y0;

        y0
    }
}
