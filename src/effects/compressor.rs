//! Compressor stage for dynamic range control.

use super::{clamp_param, db_to_linear, linear_to_db};
use serde::{Deserialize, Serialize};

/// Compressor settings.
///
/// A compressor reduces the dynamic range of audio by applying gain reduction
/// when the input exceeds a threshold. The level detector is a one-pass
/// envelope follower over the absolute sample value with separate attack and
/// release time constants.
///
/// # Parameters
///
/// - **Threshold**: level in dB above which compression starts (-60 to 0)
/// - **Ratio**: amount of compression (1 = none, 4 = moderate, 20 = limiting)
/// - **Attack**: seconds for the follower to rise (0.0001 to 1)
/// - **Release**: seconds for the follower to fall (0.001 to 2)
///
/// # Examples
///
/// ```
/// use beatcoach::effects::CompressorConfig;
///
/// let comp = CompressorConfig { ratio: 100.0, ..CompressorConfig::drum_bus() }.sanitized();
/// assert_eq!(comp.ratio, 20.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompressorConfig {
    pub enabled: bool,
    pub threshold: f64,
    pub ratio: f64,
    pub attack: f64,
    pub release: f64,
}

impl CompressorConfig {
    /// Drum bus preset.
    ///
    /// Settings: threshold -12 dB, ratio 4:1, attack 5 ms, release 100 ms
    pub fn drum_bus() -> Self {
        Self {
            enabled: true,
            threshold: -12.0,
            ratio: 4.0,
            attack: 0.005,
            release: 0.1,
        }
    }

    /// Gentle glue preset.
    ///
    /// Settings: threshold -6 dB, ratio 2:1, attack 10 ms, release 300 ms
    pub fn glue() -> Self {
        Self {
            enabled: true,
            threshold: -6.0,
            ratio: 2.0,
            attack: 0.01,
            release: 0.3,
        }
    }

    /// Returns a copy with every parameter inside its valid range.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            enabled: self.enabled,
            threshold: clamp_param(self.threshold, -60.0, 0.0, defaults.threshold),
            ratio: clamp_param(self.ratio, 1.0, 20.0, defaults.ratio),
            attack: clamp_param(self.attack, 0.0001, 1.0, defaults.attack),
            release: clamp_param(self.release, 0.001, 2.0, defaults.release),
        }
    }

    pub(crate) fn process(&self, samples: &mut [f32], sample_rate: u32) {
        let sr = f64::from(sample_rate);
        let attack_coeff = (-1.0 / (self.attack * sr)).exp();
        let release_coeff = (-1.0 / (self.release * sr)).exp();
        let mut envelope = 0.0_f64;

        for sample in samples.iter_mut() {
            let level = f64::from(sample.abs());
            let coeff = if level > envelope {
                attack_coeff
            } else {
                release_coeff
            };
            envelope = coeff * envelope + (1.0 - coeff) * level;

            let over_db = linear_to_db(envelope) - self.threshold;
            if over_db > 0.0 {
                let reduction_db = over_db - over_db / self.ratio;
                *sample *= db_to_linear(-reduction_db) as f32;
            }
        }
    }
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self::drum_bus()
    }
}
