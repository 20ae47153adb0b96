//! Noise sources for the percussive layers of the drum voices.
//!
//! White noise is used raw wherever a harsh, bright burst is wanted (snare
//! snap, rimshot). Pink noise is the warmer texture under the cymbals. The
//! `NoiseBank` keeps one long white-noise buffer around for layers that only
//! need a generic noise source.

mod bank;
mod pink;
mod white;

pub use bank::{BankNoise, NoiseBank, BANK_SECONDS};
pub use pink::PinkNoise;
pub use white::WhiteNoise;
