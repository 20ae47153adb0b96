//! Memoized drum buffers.
//!
//! Synthesis is cheap but not free, and doing it on the playback path is
//! audible. The cache synthesizes each `(voice, velocity, sample rate,
//! algorithm version)` combination at most once and hands out shared
//! read-only buffers from then on.

use crate::buffer::SampleBuffer;
use crate::effects::EffectChainConfig;
use crate::error::{ConfigError, SynthError};
use crate::voices::{velocity_gain, DrumSynth, DrumVoice, SynthesisParams, MAX_VELOCITY};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Version tag of the synthesis code. Bump whenever any voice or effect
/// changes its output so stale buffers are never mixed with new ones.
pub const ALGORITHM_VERSION: u32 = 4;

/// Velocities synthesized by `pregenerate_all` unless configured otherwise.
pub const DEFAULT_VELOCITY_LAYERS: [u8; 3] = [64, 96, 127];

/// Identifies one cached buffer.
///
/// # Examples
///
/// ```
/// use beatcoach::{CacheKey, DrumVoice};
///
/// let key = CacheKey::new(DrumVoice::Kick, 127, 44100);
/// assert_eq!(key.to_string(), "kick-127-44100-v4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub voice: DrumVoice,
    pub velocity: u8,
    pub sample_rate: u32,
    pub version: u32,
}

impl CacheKey {
    /// A key tagged with the current `ALGORITHM_VERSION`.
    pub fn new(voice: DrumVoice, velocity: u8, sample_rate: u32) -> Self {
        Self {
            voice,
            velocity,
            sample_rate,
            version: ALGORITHM_VERSION,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-v{}",
            self.voice, self.velocity, self.sample_rate, self.version
        )
    }
}

/// Counters describing cache behavior since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a ready buffer.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Buffers actually synthesized.
    pub syntheses: u64,
}

type Slot = Arc<OnceLock<Arc<SampleBuffer>>>;

/// Thread-safe memo of synthesized, effect-processed buffers.
///
/// Each key owns a `OnceLock` slot, so concurrent requests for the same key
/// wait for a single synthesis instead of racing. The map lock is only held
/// to find or insert the slot, never during synthesis.
///
/// # Examples
///
/// ```
/// use beatcoach::{DrumVoice, SampleCache};
/// use std::sync::Arc;
///
/// let cache = SampleCache::new();
/// assert!(cache.get(DrumVoice::Snare, 127, 44100).is_none());
///
/// let first = cache.pregenerate(DrumVoice::Snare, 127, 44100).unwrap();
/// let second = cache.pregenerate(DrumVoice::Snare, 127, 44100).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct SampleCache {
    synth: DrumSynth,
    effects: RwLock<EffectChainConfig>,
    entries: Mutex<HashMap<CacheKey, Slot>>,
    velocity_layers: Vec<u8>,
    hits: AtomicU64,
    misses: AtomicU64,
    syntheses: AtomicU64,
}

impl SampleCache {
    /// An empty cache with no effects and the default velocity layers.
    pub fn new() -> Self {
        Self {
            synth: DrumSynth::new(),
            effects: RwLock::new(EffectChainConfig::default()),
            entries: Mutex::new(HashMap::new()),
            velocity_layers: DEFAULT_VELOCITY_LAYERS.to_vec(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            syntheses: AtomicU64::new(0),
        }
    }

    /// Replaces the velocity layers used by `pregenerate_all`.
    ///
    /// Layers are sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// `NoVelocityLayers` for an empty list, `VelocityOutOfRange` for a layer
    /// above 127.
    pub fn with_velocity_layers(mut self, layers: &[u8]) -> Result<Self, ConfigError> {
        if layers.is_empty() {
            return Err(ConfigError::NoVelocityLayers);
        }
        if let Some(&bad) = layers.iter().find(|&&v| v > MAX_VELOCITY) {
            return Err(SynthError::VelocityOutOfRange(u32::from(bad)).into());
        }
        let mut layers = layers.to_vec();
        layers.sort_unstable();
        layers.dedup();
        self.velocity_layers = layers;
        Ok(self)
    }

    pub fn with_effects(self, config: EffectChainConfig) -> Self {
        self.set_effect_config(config);
        self
    }

    /// Returns the buffer for the key, synthesizing it first if needed.
    ///
    /// Calling this twice with the same arguments returns the same `Arc`.
    ///
    /// # Errors
    ///
    /// Validation errors for a velocity above 127 or an invalid sample rate.
    pub fn pregenerate(
        &self,
        voice: DrumVoice,
        velocity: u32,
        sample_rate: u32,
    ) -> Result<Arc<SampleBuffer>, SynthError> {
        let (buffer, was_ready) = self.obtain(voice, velocity, sample_rate)?;
        let counter = if was_ready { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(buffer)
    }

    /// `pregenerate` for a caller that already counted the miss through
    /// `get`.
    pub(crate) fn fill(
        &self,
        voice: DrumVoice,
        velocity: u32,
        sample_rate: u32,
    ) -> Result<Arc<SampleBuffer>, SynthError> {
        self.obtain(voice, velocity, sample_rate).map(|(buffer, _)| buffer)
    }

    /// The buffer for the key, and whether it was ready before this call.
    /// Callers that wait on another thread's synthesis see `false`.
    fn obtain(
        &self,
        voice: DrumVoice,
        velocity: u32,
        sample_rate: u32,
    ) -> Result<(Arc<SampleBuffer>, bool), SynthError> {
        let params = SynthesisParams::for_voice(voice, velocity, sample_rate)?;
        let key = CacheKey::new(voice, params.velocity(), sample_rate);
        let slot = self.slot(key);

        if let Some(buffer) = slot.get() {
            return Ok((Arc::clone(buffer), true));
        }
        let buffer = slot.get_or_init(|| Arc::new(self.render(voice, &params)));
        Ok((Arc::clone(buffer), false))
    }

    /// Synthesizes every voice at every velocity layer for `sample_rate`,
    /// in parallel when the `parallel` feature is enabled.
    ///
    /// Returns the number of buffers now available for that rate.
    pub fn pregenerate_all(&self, sample_rate: u32) -> Result<usize, SynthError> {
        let started = Instant::now();
        let jobs: Vec<(DrumVoice, u8)> = DrumVoice::ALL
            .into_iter()
            .flat_map(|voice| self.velocity_layers.iter().map(move |&v| (voice, v)))
            .collect();

        #[cfg(feature = "parallel")]
        let results: Result<Vec<_>, SynthError> = jobs
            .par_iter()
            .map(|&(voice, velocity)| self.pregenerate(voice, u32::from(velocity), sample_rate))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let results: Result<Vec<_>, SynthError> = jobs
            .iter()
            .map(|&(voice, velocity)| self.pregenerate(voice, u32::from(velocity), sample_rate))
            .collect();

        let count = results?.len();
        log::info!(
            "pregenerated {} drum buffers at {} Hz in {:?}",
            count,
            sample_rate,
            started.elapsed()
        );
        Ok(count)
    }

    /// Non-synthesizing lookup.
    pub fn get(&self, voice: DrumVoice, velocity: u8, sample_rate: u32) -> Option<Arc<SampleBuffer>> {
        let key = CacheKey::new(voice, velocity, sample_rate);
        let found = self
            .lock_entries()
            .get(&key)
            .and_then(|slot| slot.get().cloned());

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Drops every entry. Buffers still held by callers stay valid.
    pub fn clear(&self) {
        let mut entries = self.lock_entries();
        log::debug!("clearing {} cache entries", entries.len());
        entries.clear();
    }

    /// Changes the effects applied to buffers synthesized from now on.
    ///
    /// Cached buffers are not reprocessed; call `clear` and pregenerate again
    /// for the change to reach them.
    pub fn set_effect_config(&self, config: EffectChainConfig) {
        *self.effects.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    pub fn effect_config(&self) -> EffectChainConfig {
        self.effects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn velocity_layers(&self) -> &[u8] {
        &self.velocity_layers
    }

    /// The loudest configured layer, used for pattern playback.
    pub fn top_layer(&self) -> u8 {
        self.velocity_layers.last().copied().unwrap_or(MAX_VELOCITY)
    }

    /// Picks the softest velocity layer loud enough for a step volume, and
    /// the gain that brings that layer to exactly `volume` times full scale.
    ///
    /// Softer layers carry the softer timbre of a gentle hit, so quiet steps
    /// sound played quietly rather than turned down.
    pub fn layer_for_volume(&self, volume: f64) -> (u8, f32) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let layer = self
            .velocity_layers
            .iter()
            .copied()
            .find(|&v| velocity_gain(v) >= volume)
            .unwrap_or_else(|| self.top_layer());
        (layer, (volume / velocity_gain(layer)) as f32)
    }

    /// Number of ready buffers.
    pub fn len(&self) -> usize {
        self.lock_entries()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            syntheses: self.syntheses.load(Ordering::Relaxed),
        }
    }

    fn slot(&self, key: CacheKey) -> Slot {
        Arc::clone(self.lock_entries().entry(key).or_default())
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self, voice: DrumVoice, params: &SynthesisParams) -> SampleBuffer {
        let mut buffer = self.synth.synthesize(voice, params);
        self.effect_config().apply_to(&mut buffer);
        self.syntheses.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "synthesized {}",
            CacheKey::new(voice, params.velocity(), params.sample_rate())
        );
        buffer
    }
}

impl Default for SampleCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ReverbConfig;
    use std::thread;

    #[test]
    fn test_key_display_and_version() {
        let key = CacheKey::new(DrumVoice::OpenHihat, 64, 48000);
        assert_eq!(key.to_string(), "openHihat-64-48000-v4");
        assert_eq!(key.version, ALGORITHM_VERSION);

        let stale = CacheKey { version: ALGORITHM_VERSION - 1, ..key };
        assert_ne!(stale, key);
    }

    #[test]
    fn test_get_does_not_synthesize() {
        let cache = SampleCache::new();
        assert!(cache.get(DrumVoice::Kick, 127, 44100).is_none());
        assert_eq!(cache.stats().syntheses, 0);
        assert_eq!(cache.stats().misses, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_pregenerate_is_idempotent() {
        let cache = SampleCache::new();
        let a = cache.pregenerate(DrumVoice::Tom, 96, 44100).unwrap();
        let b = cache.pregenerate(DrumVoice::Tom, 96, 44100).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats().syntheses, 1);

        let c = cache.get(DrumVoice::Tom, 96, 44100).unwrap();
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_pregenerate_counts_hits_and_misses() {
        let cache = SampleCache::new();
        cache.pregenerate(DrumVoice::Ride, 64, 22050).unwrap();
        cache.pregenerate(DrumVoice::Ride, 64, 22050).unwrap();
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                syntheses: 1
            }
        );

        // A miss found by `get` and filled afterwards counts once
        assert!(cache.get(DrumVoice::Kick, 64, 22050).is_none());
        cache.fill(DrumVoice::Kick, 64, 22050).unwrap();
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().syntheses, 2);
    }

    #[test]
    fn test_clear_produces_fresh_buffer() {
        let cache = SampleCache::new();
        let before = cache.pregenerate(DrumVoice::Kick, 127, 44100).unwrap();
        cache.clear();
        assert!(cache.get(DrumVoice::Kick, 127, 44100).is_none());

        let after = cache.pregenerate(DrumVoice::Kick, 127, 44100).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        // Same key, same samples
        assert_eq!(*before, *after);
        assert_eq!(cache.stats().syntheses, 2);
    }

    #[test]
    fn test_validation_errors() {
        let cache = SampleCache::new();
        assert_eq!(
            cache.pregenerate(DrumVoice::Kick, 200, 44100),
            Err(SynthError::VelocityOutOfRange(200))
        );
        assert_eq!(
            cache.pregenerate(DrumVoice::Kick, 100, 0),
            Err(SynthError::InvalidSampleRate(0))
        );
        assert_eq!(cache.pregenerate_all(0), Err(SynthError::InvalidSampleRate(0)));
    }

    #[test]
    fn test_concurrent_requests_synthesize_once() {
        let cache = Arc::new(SampleCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.pregenerate(DrumVoice::Crash, 127, 22050).unwrap())
            })
            .collect();
        let buffers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let stats = cache.stats();
        assert_eq!(stats.syntheses, 1);
        // Every request is either a hit or a miss, waiters included
        assert_eq!(stats.hits + stats.misses, 8);
        assert!(stats.misses >= 1);
        assert!(buffers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_pregenerate_all() {
        let cache = SampleCache::new();
        let count = cache.pregenerate_all(22050).unwrap();
        assert_eq!(count, DrumVoice::ALL.len() * DEFAULT_VELOCITY_LAYERS.len());
        assert_eq!(cache.len(), count);
        for voice in DrumVoice::ALL {
            for velocity in DEFAULT_VELOCITY_LAYERS {
                assert!(cache.get(voice, velocity, 22050).is_some());
            }
        }

        // Already populated: nothing new is synthesized
        cache.pregenerate_all(22050).unwrap();
        assert_eq!(cache.stats().syntheses, count as u64);
    }

    #[test]
    fn test_effects_apply_to_future_syntheses_only() {
        let cache = SampleCache::new();
        let dry = cache.pregenerate(DrumVoice::Snare, 127, 44100).unwrap();

        cache.set_effect_config(EffectChainConfig::dry().with_reverb(ReverbConfig::hall()));
        let still_dry = cache.pregenerate(DrumVoice::Snare, 127, 44100).unwrap();
        assert!(Arc::ptr_eq(&dry, &still_dry));

        cache.clear();
        let wet = cache.pregenerate(DrumVoice::Snare, 127, 44100).unwrap();
        assert_ne!(*dry, *wet);
        assert!(wet.peak() <= 1.0);
    }

    #[test]
    fn test_velocity_layer_config() {
        assert!(matches!(
            SampleCache::new().with_velocity_layers(&[]),
            Err(ConfigError::NoVelocityLayers)
        ));
        assert!(matches!(
            SampleCache::new().with_velocity_layers(&[64, 200]),
            Err(ConfigError::Synth(SynthError::VelocityOutOfRange(200)))
        ));

        let cache = SampleCache::new().with_velocity_layers(&[127, 32, 32]).unwrap();
        assert_eq!(cache.velocity_layers(), &[32, 127]);
        assert_eq!(cache.top_layer(), 127);
    }

    #[test]
    fn test_layer_for_volume() {
        let cache = SampleCache::new();

        let (layer, gain) = cache.layer_for_volume(1.0);
        assert_eq!(layer, 127);
        assert!((gain - 1.0).abs() < 1e-6);

        // Quiet steps use the soft layer, scaled to the requested level
        let (layer, gain) = cache.layer_for_volume(0.3);
        assert_eq!(layer, 64);
        assert!((f64::from(gain) * velocity_gain(64) - 0.3).abs() < 1e-6);

        // velocity_gain(64) is about 0.55 and velocity_gain(96) about 0.78
        let (layer, gain) = cache.layer_for_volume(0.6);
        assert_eq!(layer, 96);
        assert!(gain <= 1.0);

        let (layer, gain) = cache.layer_for_volume(0.8);
        assert_eq!(layer, 127);
        assert!((gain - 0.8).abs() < 1e-6);

        assert_eq!(cache.layer_for_volume(f64::NAN).1, 0.0);
    }
}
