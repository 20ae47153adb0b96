//! Core trait definitions for oscillators.

/// Common interface for all oscillators.
///
/// Drum voices retune their oscillators every sample for pitch sweeps, so
/// frequency changes must keep phase continuity.
pub trait Oscillator {
    /// Sets the frequency in Hz, keeping the current phase.
    fn set_frequency(&mut self, frequency: f64);

    /// Current frequency in Hz.
    fn frequency(&self) -> f64;

    /// Resets the phase to zero.
    fn reset(&mut self);
}
