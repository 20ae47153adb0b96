//! Comb reverb stage.

use super::{clamp_param, DelayLine};
use serde::{Deserialize, Serialize};

/// Base comb delay times in seconds, before room scaling.
const COMB_SECONDS: [f64; 3] = [0.03, 0.05, 0.07];

/// Three parallel feedback combs mixed against the dry signal.
///
/// `room_size` (0 to 1) scales the comb delays from half to one and a half
/// times their base length and raises the feedback. `wet_level` (0 to 1) is
/// the wet share of the output. The reverb tail is cut at the end of the
/// buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReverbConfig {
    pub enabled: bool,
    pub room_size: f64,
    pub wet_level: f64,
}

impl ReverbConfig {
    pub fn small_room() -> Self {
        Self {
            enabled: true,
            room_size: 0.3,
            wet_level: 0.2,
        }
    }

    pub fn hall() -> Self {
        Self {
            enabled: true,
            room_size: 0.9,
            wet_level: 0.35,
        }
    }

    pub fn sanitized(self) -> Self {
        Self {
            enabled: self.enabled,
            room_size: clamp_param(self.room_size, 0.0, 1.0, 0.5),
            wet_level: clamp_param(self.wet_level, 0.0, 1.0, 0.0),
        }
    }

    /// Comb feedback for the configured room, always below 0.9.
    pub fn feedback(&self) -> f64 {
        0.3 + 0.5 * self.room_size.clamp(0.0, 1.0)
    }

    pub(crate) fn process(&self, samples: &mut [f32], sample_rate: u32) {
        let scale = 0.5 + self.room_size;
        let mut combs = COMB_SECONDS.map(|seconds| {
            DelayLine::new((seconds * scale * f64::from(sample_rate)).round() as usize)
        });
        let feedback = self.feedback() as f32;
        let wet = self.wet_level as f32;

        for sample in samples.iter_mut() {
            let dry = *sample;
            let reverb: f32 = combs
                .iter_mut()
                .map(|comb| comb.comb(dry, feedback))
                .sum::<f32>()
                / COMB_SECONDS.len() as f32;
            *sample = dry * (1.0 - wet) + reverb * wet;
        }
    }
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            room_size: 0.5,
            wet_level: 0.0,
        }
    }
}
