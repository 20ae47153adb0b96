//! Envelope generators and curve utilities for shaping drum hits.
//!
//! Percussion lives almost entirely in its envelopes: the voices combine
//! exponential decays for tails with a short ADSR where a distinct attack
//! shape matters.

mod adsr;
mod curve;
mod decay;

pub use adsr::Adsr;
pub use curve::Curve;
pub use decay::ExpDecay;
