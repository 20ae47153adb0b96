//! Core per-sample generator trait.
//!
//! Every building block the drum voices are assembled from (oscillators, noise
//! sources, envelopes, filters) implements `Signal`, so a voice is just a loop
//! that pulls one sample from each of its layers and mixes them.

/// Common interface for all per-sample generators and processors.
pub trait Signal {
    /// Generates the next sample.
    ///
    /// # Returns
    ///
    /// A sample value, typically between -1.0 and 1.0 for audio signals and
    /// between 0.0 and 1.0 for envelopes.
    fn next_sample(&mut self) -> f64;

    /// Generates multiple samples into a buffer.
    ///
    /// Default implementation calls `next_sample()` for each element.
    fn process(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Collects the next `len` samples into a new vector.
    ///
    /// # Examples
    ///
    /// ```
    /// use beatcoach::Signal;
    ///
    /// let mut dc = 0.25_f64;
    /// assert_eq!(dc.take_samples(3), vec![0.25, 0.25, 0.25]);
    /// ```
    fn take_samples(&mut self, len: usize) -> Vec<f64> {
        let mut buffer = vec![0.0; len];
        self.process(&mut buffer);
        buffer
    }
}

/// A constant value is a signal that never changes.
impl Signal for f64 {
    fn next_sample(&mut self) -> f64 {
        *self
    }

    fn process(&mut self, buffer: &mut [f64]) {
        buffer.fill(*self);
    }
}
