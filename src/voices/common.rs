//! State shared by every voice algorithm for one synthesis call.

use super::{DrumVoice, SynthesisParams};
use crate::noise::{BankNoise, NoiseBank, PinkNoise, WhiteNoise};

/// Highest tuning any voice layer may use, as a fraction of the sample rate.
const MAX_TUNING_RATIO: f64 = 0.45;

pub(crate) struct VoiceContext<'a> {
    pub sample_rate: f64,
    pub len: usize,
    /// Velocity normalized to [0, 1]. Shapes timbre only; loudness is applied
    /// after normalization.
    pub intensity: f64,
    pub fundamental: f64,
    seed: u64,
    rate_hz: u32,
    bank: &'a NoiseBank,
}

impl<'a> VoiceContext<'a> {
    pub fn new(voice: DrumVoice, params: &SynthesisParams, bank: &'a NoiseBank) -> Self {
        let sample_rate = f64::from(params.sample_rate());
        let fundamental = params
            .fundamental_hz()
            .unwrap_or_else(|| voice.default_fundamental());
        Self {
            sample_rate,
            len: params.sample_count(),
            intensity: f64::from(params.velocity()) / 127.0,
            fundamental: fundamental.min(sample_rate * MAX_TUNING_RATIO),
            seed: params.seed(voice),
            rate_hz: params.sample_rate(),
            bank,
        }
    }

    /// Clamps a layer frequency below Nyquist.
    pub fn tuned(&self, hz: f64) -> f64 {
        hz.min(self.sample_rate * MAX_TUNING_RATIO)
    }

    /// Independent white noise stream; `layer` separates streams within a voice.
    pub fn white(&self, layer: u64) -> WhiteNoise {
        WhiteNoise::seeded(self.seed.wrapping_add(layer))
    }

    pub fn pink(&self, layer: u64) -> PinkNoise {
        PinkNoise::seeded(self.seed.wrapping_add(layer))
    }

    /// Generic noise read from the shared bank at a seed-dependent offset.
    pub fn bank_noise(&self) -> BankNoise {
        self.bank.reader(self.rate_hz, (self.seed >> 16) as usize)
    }

    pub fn seconds(&self, index: usize) -> f64 {
        index as f64 / self.sample_rate
    }
}
