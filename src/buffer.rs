//! Mono sample buffers produced by the drum voices.

/// Fade-in length applied to every synthesized buffer, in seconds.
pub const FADE_IN_SECONDS: f64 = 0.0005;

/// Maximum fade-out length applied to every synthesized buffer, in seconds.
pub const FADE_OUT_SECONDS: f64 = 0.003;

/// A mono buffer of `f32` samples at a fixed sample rate.
///
/// Buffers leave the synthesizers peak-normalized (`max |s| <= 1.0`) and with
/// short boundary fades. Once memoized by the sample cache they are shared
/// read-only behind an `Arc`.
///
/// # Examples
///
/// ```
/// use beatcoach::SampleBuffer;
///
/// let mut buffer = SampleBuffer::from_f64(vec![0.0, 2.0, -4.0], 44100);
/// buffer.limit_peak();
/// assert_eq!(buffer.peak(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wraps already computed samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Creates a buffer of `len` zero samples.
    pub fn silence(len: usize, sample_rate: u32) -> Self {
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Converts the `f64` working buffer of a voice into a sample buffer.
    pub fn from_f64(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self::new(samples.into_iter().map(|s| s as f32).collect(), sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the buffer in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value (0.0 for an empty buffer).
    pub fn peak(&self) -> f32 {
        peak(&self.samples)
    }

    /// Scales the buffer down so its peak is at most 1.0.
    ///
    /// Buffers already within range are left untouched, so quiet buffers keep
    /// their level.
    pub fn limit_peak(&mut self) {
        limit_peak(&mut self.samples);
    }

    /// Scales the buffer so its peak is exactly `target`.
    pub fn normalize_to(&mut self, target: f32) {
        normalize_to(&mut self.samples, target);
    }

    /// Multiplies every sample by `gain`.
    pub fn scale(&mut self, gain: f32) {
        for sample in self.samples.iter_mut() {
            *sample *= gain;
        }
    }

    /// Applies a linear fade-in and fade-out to avoid clicks at the edges.
    pub fn apply_fades(&mut self) {
        apply_fades(&mut self.samples, self.sample_rate);
    }

    /// Mixes `other` into this buffer starting at `offset` samples, scaled by
    /// `gain`. Samples past the end of this buffer are dropped.
    pub fn mix_in(&mut self, other: &[f32], offset: usize, gain: f32) {
        if offset >= self.samples.len() {
            return;
        }
        for (dst, src) in self.samples[offset..].iter_mut().zip(other) {
            *dst += src * gain;
        }
    }

    /// Writes the buffer as a 32-bit float mono WAV file.
    #[cfg(feature = "wav-export")]
    pub fn write_wav(&self, path: impl AsRef<std::path::Path>) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }
}

/// Largest absolute value in `samples`.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

/// Scales `samples` down so the peak is at most 1.0 and replaces any
/// non-finite sample with silence.
pub fn limit_peak(samples: &mut [f32]) {
    for sample in samples.iter_mut() {
        if !sample.is_finite() {
            *sample = 0.0;
        }
    }
    let peak = peak(samples);
    if peak > 1.0 {
        let scale = 1.0 / peak;
        for sample in samples.iter_mut() {
            *sample *= scale;
        }
    }
}

/// Scales `samples` so the peak is exactly `target`. Silent input stays silent.
pub fn normalize_to(samples: &mut [f32], target: f32) {
    let peak = peak(samples);
    if peak <= f32::EPSILON || !peak.is_finite() {
        return;
    }
    let scale = target / peak;
    for sample in samples.iter_mut() {
        *sample *= scale;
    }
}

/// Linear fade-in over `FADE_IN_SECONDS` and fade-out over at most
/// `FADE_OUT_SECONDS`. Each fade is capped at a quarter of the buffer so very
/// short buffers keep a body.
pub fn apply_fades(samples: &mut [f32], sample_rate: u32) {
    let len = samples.len();
    if len < 2 {
        return;
    }
    let cap = (len / 4).max(1);
    let fade_in = ((FADE_IN_SECONDS * sample_rate as f64) as usize).clamp(1, cap);
    let fade_out = ((FADE_OUT_SECONDS * sample_rate as f64) as usize).clamp(1, cap);

    for (i, sample) in samples.iter_mut().take(fade_in).enumerate() {
        *sample *= i as f32 / fade_in as f32;
    }
    for (i, sample) in samples.iter_mut().rev().take(fade_out).enumerate() {
        *sample *= i as f32 / fade_out as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_of_empty_buffer() {
        let buffer = SampleBuffer::silence(0, 44100);
        assert_eq!(buffer.peak(), 0.0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_limit_peak_only_scales_down() {
        let mut loud = SampleBuffer::new(vec![0.5, -2.0, 1.0], 44100);
        loud.limit_peak();
        assert_eq!(loud.samples(), &[0.25, -1.0, 0.5]);

        let mut quiet = SampleBuffer::new(vec![0.1, -0.2], 44100);
        quiet.limit_peak();
        assert_eq!(quiet.samples(), &[0.1, -0.2]);
    }

    #[test]
    fn test_limit_peak_scrubs_non_finite() {
        let mut samples = vec![f32::NAN, 0.5, f32::INFINITY];
        limit_peak(&mut samples);
        assert_eq!(samples, vec![0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_normalize_to_target() {
        let mut samples = vec![0.1_f32, -0.4, 0.2];
        normalize_to(&mut samples, 1.0);
        assert!((samples[1] + 1.0).abs() < 1e-6);
        assert!((samples[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_silence_is_noop() {
        let mut samples = vec![0.0_f32; 8];
        normalize_to(&mut samples, 1.0);
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_fades_zero_the_edges() {
        let mut buffer = SampleBuffer::new(vec![1.0; 4410], 44100);
        buffer.apply_fades();
        let samples = buffer.samples();
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[samples.len() - 1], 0.0);
        // Middle untouched
        assert_eq!(samples[2205], 1.0);
    }

    #[test]
    fn test_fades_on_tiny_buffers() {
        for len in 0..6 {
            let mut samples = vec![1.0_f32; len];
            apply_fades(&mut samples, 44100);
            assert!(samples.iter().all(|s| s.is_finite() && *s <= 1.0));
        }
    }

    #[test]
    fn test_mix_in_with_offset() {
        let mut target = SampleBuffer::silence(4, 44100);
        target.mix_in(&[1.0, 1.0, 1.0], 2, 0.5);
        assert_eq!(target.samples(), &[0.0, 0.0, 0.5, 0.5]);

        target.mix_in(&[1.0], 10, 1.0);
        assert_eq!(target.len(), 4);
    }

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::silence(22050, 44100);
        assert!((buffer.duration_seconds() - 0.5).abs() < 1e-12);
    }
}
