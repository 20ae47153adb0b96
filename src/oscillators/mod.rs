//! Oscillators used as the tonal layers of the drum voices.

mod fm;
mod sine;
mod traits;

pub use fm::FmOperator;
pub use sine::SineOscillator;
pub use traits::Oscillator;
