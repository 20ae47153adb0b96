//! Shared long white-noise buffer.

use super::WhiteNoise;
use crate::Signal;
use std::sync::{Arc, Mutex, PoisonError};

/// Length of the cached noise buffer in seconds.
pub const BANK_SECONDS: f64 = 2.0;

/// Holds one long white-noise buffer for the current sample rate.
///
/// The buffer is generated on first use and kept until a caller asks for a
/// different sample rate, at which point it is regenerated. It is seeded, so
/// every regeneration at a given rate yields the same samples.
#[derive(Debug)]
pub struct NoiseBank {
    seed: u64,
    current: Mutex<Option<(u32, Arc<[f32]>)>>,
}

impl NoiseBank {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            current: Mutex::new(None),
        }
    }

    /// Returns the noise buffer for `sample_rate`, generating it if the cached
    /// one was made for another rate.
    pub fn white(&self, sample_rate: u32) -> Arc<[f32]> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((rate, buffer)) = current.as_ref() {
            if *rate == sample_rate {
                return Arc::clone(buffer);
            }
        }

        let len = ((sample_rate as f64 * BANK_SECONDS) as usize).max(1);
        let mut noise = WhiteNoise::seeded(self.seed ^ u64::from(sample_rate));
        let buffer: Arc<[f32]> = (0..len).map(|_| noise.next_sample() as f32).collect();
        log::debug!("regenerated {} sample noise bank at {} Hz", len, sample_rate);

        *current = Some((sample_rate, Arc::clone(&buffer)));
        buffer
    }

    /// A signal reading the bank for `sample_rate` from `start`, wrapping at the end.
    pub fn reader(&self, sample_rate: u32, start: usize) -> BankNoise {
        let buffer = self.white(sample_rate);
        let position = start % buffer.len();
        BankNoise { buffer, position }
    }

    /// Sample rate of the currently cached buffer, if any.
    pub fn cached_rate(&self) -> Option<u32> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(rate, _)| *rate)
    }
}

impl Default for NoiseBank {
    fn default() -> Self {
        Self::new(0x5eed_0f_b0a7)
    }
}

/// Cyclic reader over a `NoiseBank` buffer.
pub struct BankNoise {
    buffer: Arc<[f32]>,
    position: usize,
}

impl Signal for BankNoise {
    fn next_sample(&mut self) -> f64 {
        let sample = self.buffer[self.position];
        self.position = (self.position + 1) % self.buffer.len();
        f64::from(sample)
    }
}
