//! Filters shared by the voices and the equalizer.
//!
//! Unlike the generators these are processors: they take one input sample and
//! return one output sample, so they can run over a working buffer in place.

mod biquad;
mod one_pole;

pub use biquad::{Biquad, FilterType};
pub use one_pole::OnePole;
