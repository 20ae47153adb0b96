//! Pink noise generator.

use super::WhiteNoise;
use crate::Signal;
use rand::Rng;
use rand::rngs::StdRng;

/// Output scaling that keeps the filter's typical output inside [-1, 1].
const OUTPUT_GAIN: f64 = 0.11;

/// A pink noise generator.
///
/// Pink (1/f) noise has equal power per octave, so it sounds darker and less
/// harsh than white noise. This implementation runs white noise through Paul
/// Kellet's refined six-pole IIR filter, which tracks the -3 dB/octave slope
/// within about 0.05 dB across the audio band.
///
/// # Examples
///
/// ```
/// use beatcoach::{PinkNoise, Signal};
///
/// let mut noise = PinkNoise::seeded(7);
/// let sample = noise.next_sample();
/// assert!(sample.abs() < 1.0);
/// ```
pub struct PinkNoise<R: Rng = StdRng> {
    white: WhiteNoise<R>,
    poles: [f64; 7],
}

impl PinkNoise<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::from_white(WhiteNoise::seeded(seed))
    }
}

impl<R: Rng> PinkNoise<R> {
    /// Filters the given white noise source.
    pub fn from_white(white: WhiteNoise<R>) -> Self {
        Self {
            white,
            poles: [0.0; 7],
        }
    }
}

impl<R: Rng> Signal for PinkNoise<R> {
    fn next_sample(&mut self) -> f64 {
        let white = self.white.next_sample();
        let b = &mut self.poles;

        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;

        let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115926;

        pink * OUTPUT_GAIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mean absolute first difference, a cheap proxy for high-frequency energy.
    fn roughness(samples: &[f64]) -> f64 {
        let rms = (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt();
        let diff: f64 = samples.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        diff / (samples.len() - 1) as f64 / rms
    }

    #[test]
    fn test_sample_range() {
        let mut noise = PinkNoise::seeded(11);
        for _ in 0..10000 {
            let sample = noise.next_sample();
            assert!(sample.abs() < 1.0, "sample {}", sample);
        }
    }

    #[test]
    fn test_darker_than_white() {
        let pink = PinkNoise::seeded(12).take_samples(44100);
        let white = WhiteNoise::seeded(12).take_samples(44100);
        assert!(roughness(&pink) < roughness(&white) * 0.8);
    }

    #[test]
    fn test_deterministic() {
        let a = PinkNoise::seeded(13).take_samples(256);
        let b = PinkNoise::seeded(13).take_samples(256);
        assert_eq!(a, b);
    }
}
