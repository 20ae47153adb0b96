//! Engine configuration.

use crate::cache::DEFAULT_VELOCITY_LAYERS;
use crate::effects::EffectChainConfig;
use crate::error::{ConfigError, SynthError};
use crate::voices::{MAX_SAMPLE_RATE, MAX_VELOCITY};
use serde::{Deserialize, Serialize};

/// What the scheduler does when a step needs a buffer that was never
/// pregenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheMissPolicy {
    /// Synthesize on the spot and play it late. The first hit may glitch.
    #[default]
    SynthesizeNow,
    /// Drop the hit.
    Skip,
}

/// Settings for a `BeatEngine`.
///
/// Every field has a default, so an empty JSON object is a valid config.
///
/// # Examples
///
/// ```
/// use beatcoach::{CacheMissPolicy, EngineConfig};
///
/// let config = EngineConfig::from_json(r#"{"sampleRate": 48000, "cacheMiss": "skip"}"#).unwrap();
/// assert_eq!(config.sample_rate, 48000);
/// assert_eq!(config.cache_miss, CacheMissPolicy::Skip);
/// assert_eq!(config.velocity_layers, vec![64, 96, 127]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub velocity_layers: Vec<u8>,
    pub effects: EffectChainConfig,
    pub cache_miss: CacheMissPolicy,
    /// Synthesize every voice and layer when the engine is built.
    pub pregenerate: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            velocity_layers: DEFAULT_VELOCITY_LAYERS.to_vec(),
            effects: EffectChainConfig::default(),
            cache_miss: CacheMissPolicy::default(),
            pregenerate: true,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_effects(mut self, effects: EffectChainConfig) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_cache_miss(mut self, policy: CacheMissPolicy) -> Self {
        self.cache_miss = policy;
        self
    }

    pub fn with_pregenerate(mut self, pregenerate: bool) -> Self {
        self.pregenerate = pregenerate;
        self
    }

    /// Rejects settings the engine cannot run with. Effect parameters are
    /// not checked here; they are clamped when applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.velocity_layers.is_empty() {
            return Err(ConfigError::NoVelocityLayers);
        }
        if let Some(&bad) = self.velocity_layers.iter().find(|&&v| v > MAX_VELOCITY) {
            return Err(SynthError::VelocityOutOfRange(u32::from(bad)).into());
        }
        Ok(())
    }
}
