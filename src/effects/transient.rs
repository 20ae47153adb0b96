//! Transient shaper stage.

use super::clamp_param;
use crate::buffer;
use serde::{Deserialize, Serialize};

const SHORT_WINDOW_SECONDS: f64 = 0.01;
const LONG_WINDOW_SECONDS: f64 = 0.05;

/// Independent gains for the attack and sustain portions of a hit.
///
/// Each sample is classified by comparing the mean energy over the last 10 ms
/// with the mean energy over the last 50 ms: where the short window is louder
/// the signal is rising (a transient), otherwise it is sustaining. Gains are
/// linear multipliers in [0, 4]. The original peak level is restored
/// afterwards, so the stage changes shape rather than loudness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransientConfig {
    pub enabled: bool,
    pub attack: f64,
    pub sustain: f64,
}

impl TransientConfig {
    /// Emphasized attack, shortened tail.
    pub fn punch() -> Self {
        Self {
            enabled: true,
            attack: 1.5,
            sustain: 0.8,
        }
    }

    pub fn sanitized(self) -> Self {
        Self {
            enabled: self.enabled,
            attack: clamp_param(self.attack, 0.0, 4.0, 1.0),
            sustain: clamp_param(self.sustain, 0.0, 4.0, 1.0),
        }
    }

    pub(crate) fn process(&self, samples: &mut [f32], sample_rate: u32) {
        let original_peak = buffer::peak(samples);
        if original_peak == 0.0 {
            return;
        }

        let sr = f64::from(sample_rate);
        let short = ((SHORT_WINDOW_SECONDS * sr) as usize).max(1);
        let long = ((LONG_WINDOW_SECONDS * sr) as usize).max(short);

        // Prefix sums of energy give each window mean in constant time. Time
        // before the buffer counts as silence, so an onset reads as a transient.
        let mut energy = Vec::with_capacity(samples.len() + 1);
        energy.push(0.0_f64);
        let mut total = 0.0;
        for &sample in samples.iter() {
            total += f64::from(sample) * f64::from(sample);
            energy.push(total);
        }
        let window_mean = |end: usize, len: usize| {
            let start = end.saturating_sub(len);
            (energy[end] - energy[start]) / len as f64
        };

        for (i, sample) in samples.iter_mut().enumerate() {
            let short_energy = window_mean(i + 1, short);
            let long_energy = window_mean(i + 1, long);
            let transience = if long_energy > 0.0 {
                (short_energy / long_energy - 1.0).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let gain = self.sustain + (self.attack - self.sustain) * transience;
            *sample *= gain as f32;
        }

        let shaped_peak = buffer::peak(samples);
        if shaped_peak > 0.0 {
            let restore = original_peak / shaped_peak;
            for sample in samples.iter_mut() {
                *sample *= restore;
            }
        }
    }
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attack: 1.0,
            sustain: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A hit: loud for 5 ms, then a quiet tail.
    fn hit() -> Vec<f32> {
        (0..8820)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                if i < 220 { sign * 0.9 } else { sign * 0.2 }
            })
            .collect()
    }

    #[test]
    fn test_peak_preserved() {
        let mut samples = hit();
        TransientConfig::punch().process(&mut samples, 44100);
        assert!((buffer::peak(&samples) - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_punch_lowers_tail_relative_to_attack() {
        let mut samples = hit();
        TransientConfig::punch().process(&mut samples, 44100);
        let tail = samples[8000].abs();
        let head = samples[100].abs();
        assert!(tail / head < 0.2 / 0.9, "ratio {}", tail / head);
    }

    #[test]
    fn test_unity_gains_change_nothing() {
        let original = hit();
        let mut samples = original.clone();
        TransientConfig {
            enabled: true,
            attack: 1.0,
            sustain: 1.0,
        }
        .process(&mut samples, 44100);
        for (a, b) in samples.iter().zip(&original) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_silence_and_zero_gains() {
        let mut silent = vec![0.0_f32; 100];
        TransientConfig::punch().process(&mut silent, 44100);
        assert!(silent.iter().all(|&s| s == 0.0));

        let mut samples = hit();
        TransientConfig {
            enabled: true,
            attack: 0.0,
            sustain: 0.0,
        }
        .process(&mut samples, 44100);
        assert!(samples.iter().all(|&s| s == 0.0));
    }
}
