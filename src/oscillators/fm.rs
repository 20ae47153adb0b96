//! Two-operator frequency modulation.

use super::{Oscillator, SineOscillator};
use crate::Signal;
use std::f64::consts::TAU;

/// A carrier sine phase-modulated by a second sine at a fixed ratio.
///
/// The modulator tracks the carrier, so sweeping the carrier frequency sweeps
/// the whole inharmonic spectrum with it (used for cymbal tones).
#[derive(Debug, Clone)]
pub struct FmOperator {
    carrier_phase: f64,
    carrier_increment: f64,
    modulator: SineOscillator,
    ratio: f64,
    index: f64,
    sample_rate: f64,
}

impl FmOperator {
    /// # Arguments
    ///
    /// * `frequency` - Carrier frequency in Hz
    /// * `ratio` - Modulator frequency as a multiple of the carrier
    /// * `index` - Modulation depth in radians
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(frequency: f64, ratio: f64, index: f64, sample_rate: f64) -> Self {
        Self {
            carrier_phase: 0.0,
            carrier_increment: frequency / sample_rate,
            modulator: SineOscillator::new(frequency * ratio, sample_rate),
            ratio,
            index,
            sample_rate,
        }
    }

    pub fn set_index(&mut self, index: f64) {
        self.index = index;
    }
}

impl Signal for FmOperator {
    fn next_sample(&mut self) -> f64 {
        let modulation = self.modulator.next_sample() * self.index;
        let sample = (self.carrier_phase * TAU + modulation).sin();
        self.carrier_phase += self.carrier_increment;
        self.carrier_phase -= self.carrier_phase.floor();
        sample
    }
}

impl Oscillator for FmOperator {
    fn set_frequency(&mut self, frequency: f64) {
        self.carrier_increment = frequency / self.sample_rate;
        self.modulator.set_frequency(frequency * self.ratio);
    }

    fn frequency(&self) -> f64 {
        self.carrier_increment * self.sample_rate
    }

    fn reset(&mut self) {
        self.carrier_phase = 0.0;
        self.modulator.reset();
    }
}
