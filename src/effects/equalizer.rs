//! Three-band equalizer stage.

use super::{clamp_param, db_to_linear};
use crate::filters::OnePole;
use serde::{Deserialize, Serialize};

/// Crossover between the low and mid bands.
pub const LOW_SPLIT_HZ: f64 = 200.0;
/// Crossover between the mid and high bands.
pub const HIGH_SPLIT_HZ: f64 = 5000.0;

/// Low/mid/high gains in dB, each clamped to [-24, 24].
///
/// The low band is a one-pole low-pass at 200 Hz, the high band a one-pole
/// high-pass at 5 kHz, and the mid band whatever is left. With all gains at
/// 0 dB the stage passes the signal through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EqualizerConfig {
    pub enabled: bool,
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl EqualizerConfig {
    /// Lifted lows and highs, slightly scooped mids.
    pub fn smile() -> Self {
        Self {
            enabled: true,
            low: 3.0,
            mid: -2.0,
            high: 2.0,
        }
    }

    pub fn sanitized(self) -> Self {
        Self {
            enabled: self.enabled,
            low: clamp_param(self.low, -24.0, 24.0, 0.0),
            mid: clamp_param(self.mid, -24.0, 24.0, 0.0),
            high: clamp_param(self.high, -24.0, 24.0, 0.0),
        }
    }

    pub(crate) fn process(&self, samples: &mut [f32], sample_rate: u32) {
        let sr = f64::from(sample_rate);
        let mut low_split = OnePole::new(LOW_SPLIT_HZ, sr);
        let mut high_split = OnePole::new(HIGH_SPLIT_HZ, sr);
        let (low_gain, mid_gain, high_gain) = (
            db_to_linear(self.low),
            db_to_linear(self.mid),
            db_to_linear(self.high),
        );

        for sample in samples.iter_mut() {
            let input = f64::from(*sample);
            let low = low_split.lowpass(input);
            let high = high_split.highpass(input);
            let mid = input - low - high;
            *sample = (low * low_gain + mid * mid_gain + high * high_gain) as f32;
        }
    }
}
