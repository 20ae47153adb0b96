//! Post-processing applied to freshly synthesized drum buffers.
//!
//! The chain always runs in the same order:
//!
//! 1. compressor (dynamics first)
//! 2. equalizer
//! 3. transient shaper
//! 4. reverb (last, since it smears transients)
//!
//! followed by a peak limit to 1.0. Every stage is configured by a plain value
//! with an `enabled` flag, processes with fresh state per buffer, and clamps
//! out-of-range parameters instead of rejecting them.
//!
//! # Examples
//!
//! ```
//! use beatcoach::effects::{self, EffectChainConfig};
//!
//! let mut samples = vec![0.0_f32, 0.9, -0.7, 0.4, 0.1];
//! effects::apply(&mut samples, 44100, &EffectChainConfig::punchy());
//! assert!(samples.iter().all(|s| s.abs() <= 1.0));
//! ```

mod compressor;
mod delay;
mod equalizer;
mod reverb;
mod transient;

pub use compressor::CompressorConfig;
pub use delay::DelayLine;
pub use equalizer::{EqualizerConfig, HIGH_SPLIT_HZ, LOW_SPLIT_HZ};
pub use reverb::ReverbConfig;
pub use transient::TransientConfig;

use crate::buffer::{self, SampleBuffer};
use serde::{Deserialize, Serialize};

/// Which stages run, and how.
///
/// Absent stages and stages with `enabled: false` are skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectChainConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressor: Option<CompressorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equalizer: Option<EqualizerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverb: Option<ReverbConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient: Option<TransientConfig>,
}

impl EffectChainConfig {
    /// No processing at all.
    pub fn dry() -> Self {
        Self::default()
    }

    /// Tight drum-bus compression with a sharpened attack.
    pub fn punchy() -> Self {
        Self::dry()
            .with_compressor(CompressorConfig::drum_bus())
            .with_transient(TransientConfig::punch())
    }

    /// A small room around a slightly scooped kit.
    pub fn roomy() -> Self {
        Self::dry()
            .with_equalizer(EqualizerConfig::smile())
            .with_reverb(ReverbConfig::small_room())
    }

    pub fn with_compressor(mut self, config: CompressorConfig) -> Self {
        self.compressor = Some(config);
        self
    }

    pub fn with_equalizer(mut self, config: EqualizerConfig) -> Self {
        self.equalizer = Some(config);
        self
    }

    pub fn with_reverb(mut self, config: ReverbConfig) -> Self {
        self.reverb = Some(config);
        self
    }

    pub fn with_transient(mut self, config: TransientConfig) -> Self {
        self.transient = Some(config);
        self
    }

    /// True when no stage would touch the signal.
    pub fn is_dry(&self) -> bool {
        !self.compressor.is_some_and(|c| c.enabled)
            && !self.equalizer.is_some_and(|c| c.enabled)
            && !self.reverb.is_some_and(|c| c.enabled)
            && !self.transient.is_some_and(|c| c.enabled)
    }

    /// Runs the chain over a buffer in place.
    pub fn apply_to(&self, buffer: &mut SampleBuffer) {
        let sample_rate = buffer.sample_rate();
        apply(buffer.samples_mut(), sample_rate, self);
    }
}

/// Runs the chain over `samples` in place and limits the result to a peak of
/// 1.0.
///
/// Buffers of any length are accepted, including empty ones.
pub fn apply(samples: &mut [f32], sample_rate: u32, config: &EffectChainConfig) {
    if samples.is_empty() || sample_rate == 0 {
        return;
    }

    if let Some(compressor) = config.compressor.filter(|c| c.enabled) {
        compressor.sanitized().process(samples, sample_rate);
    }
    if let Some(equalizer) = config.equalizer.filter(|c| c.enabled) {
        equalizer.sanitized().process(samples, sample_rate);
    }
    if let Some(transient) = config.transient.filter(|c| c.enabled) {
        transient.sanitized().process(samples, sample_rate);
    }
    if let Some(reverb) = config.reverb.filter(|c| c.enabled) {
        reverb.sanitized().process(samples, sample_rate);
    }

    buffer::limit_peak(samples);
}

/// Clamps a parameter, replacing NaN and infinities with `fallback`.
pub(crate) fn clamp_param(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

pub(crate) fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

pub(crate) fn linear_to_db(linear: f64) -> f64 {
    20.0 * linear.max(1e-6).log10()
}
