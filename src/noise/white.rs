//! White noise generator.

use crate::Signal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A white noise generator.
///
/// Each sample is uniformly distributed in [-1.0, 1.0]. Voices construct it
/// with `seeded` so the same cache key always produces the same buffer.
///
/// # Examples
///
/// ```
/// use beatcoach::{Signal, WhiteNoise};
///
/// let mut a = WhiteNoise::seeded(42);
/// let mut b = WhiteNoise::seeded(42);
/// assert_eq!(a.take_samples(16), b.take_samples(16));
/// ```
pub struct WhiteNoise<R: Rng = StdRng> {
    rng: R,
}

impl WhiteNoise<StdRng> {
    /// Creates a reproducible generator from a seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> WhiteNoise<R> {
    /// Creates a generator drawing from a custom RNG.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Signal for WhiteNoise<R> {
    fn next_sample(&mut self) -> f64 {
        self.rng.gen_range(-1.0..=1.0)
    }
}
