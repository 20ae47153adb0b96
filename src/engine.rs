//! The assembled drum machine: cache, scheduler and playback thread.

use crate::buffer::SampleBuffer;
use crate::cache::SampleCache;
use crate::config::EngineConfig;
use crate::effects::EffectChainConfig;
use crate::error::{EngineError, SynthError};
use crate::pattern::BeatPattern;
use crate::render;
use crate::sequencer::{
    AudioSink, BeatPosition, BeatTracker, Scheduler, StepEvent, SystemClock, Transport,
    TransportState,
};
use std::sync::Arc;

/// A drum machine playing into an `AudioSink`.
///
/// Building an engine validates the config, optionally synthesizes every
/// voice at every velocity layer, and starts the transport thread. The
/// cache is shared, so the same buffers can also be bounced offline.
///
/// # Examples
///
/// ```
/// use beatcoach::sequencer::MemorySink;
/// use beatcoach::{BeatEngine, BeatPattern, DrumVoice, EngineConfig, PatternStep};
///
/// let sink = MemorySink::new();
/// let config = EngineConfig::default().with_sample_rate(8000);
/// let engine = BeatEngine::new(config, sink.clone()).unwrap();
/// assert_eq!(engine.cache().len(), 24);
///
/// let mut pattern = BeatPattern::empty(120.0, 16).unwrap();
/// pattern.set_step(0, PatternStep::of(&[(DrumVoice::Kick, 1.0)])).unwrap();
/// engine.play(pattern);
/// assert_eq!(sink.play_count(), 1);
/// engine.stop();
/// ```
pub struct BeatEngine<S: AudioSink + 'static> {
    config: EngineConfig,
    cache: Arc<SampleCache>,
    transport: Transport<S>,
}

impl<S: AudioSink + 'static> BeatEngine<S> {
    pub fn new(config: EngineConfig, sink: S) -> Result<Self, EngineError> {
        config.validate()?;
        let cache = Arc::new(
            SampleCache::new()
                .with_velocity_layers(&config.velocity_layers)?
                .with_effects(config.effects.clone()),
        );
        if config.pregenerate {
            cache.pregenerate_all(config.sample_rate)?;
        }

        let scheduler = Scheduler::new(SystemClock, sink, Arc::clone(&cache), config.sample_rate)
            .with_cache_miss(config.cache_miss);
        let transport = Transport::spawn(scheduler)?;
        log::info!(
            "beat engine ready at {} Hz with {} cached buffers",
            config.sample_rate,
            cache.len()
        );

        Ok(Self {
            config,
            cache,
            transport,
        })
    }

    /// Starts `pattern` from its first step, replacing anything playing.
    pub fn play(&self, pattern: BeatPattern) {
        self.transport.start(pattern);
    }

    pub fn stop(&self) {
        self.transport.stop();
    }

    pub fn pause(&self) {
        self.transport.pause();
    }

    pub fn resume(&self) {
        self.transport.resume();
    }

    /// Applies an edited pattern to the running loop.
    pub fn update_pattern(&self, pattern: BeatPattern) {
        self.transport.update_pattern(pattern);
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == TransportState::Playing
    }

    /// The pattern currently loaded, if any.
    pub fn pattern(&self) -> Option<BeatPattern> {
        self.transport.pattern()
    }

    /// A handle other threads can poll for the beat position.
    pub fn tracker(&self) -> BeatTracker {
        self.transport.tracker().clone()
    }

    pub fn beat_position(&self) -> Option<BeatPosition> {
        self.transport.tracker().position()
    }

    /// Runs on the transport thread after every step; must not call back
    /// into the engine.
    pub fn set_step_listener(&self, listener: impl FnMut(&StepEvent) + Send + 'static) {
        self.transport.set_step_listener(listener);
    }

    pub fn cache(&self) -> &Arc<SampleCache> {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the effect chain and rebuilds the cache with it.
    ///
    /// The old buffers are dropped first. Hits that fire before
    /// pregeneration has reached their key follow the cache miss policy, so
    /// under `SynthesizeNow` the transport thread may render a few of them
    /// itself. Each key is still synthesized only once.
    pub fn set_effects(&mut self, effects: EffectChainConfig) -> Result<(), SynthError> {
        self.cache.set_effect_config(effects.clone());
        self.config.effects = effects;
        self.cache.clear();
        if self.config.pregenerate {
            self.cache.pregenerate_all(self.config.sample_rate)?;
        }
        Ok(())
    }

    /// Renders `loops` passes of `pattern` offline at the engine's rate.
    pub fn bounce(&self, pattern: &BeatPattern, loops: usize) -> Result<SampleBuffer, SynthError> {
        render::bounce(pattern, &self.cache, self.config.sample_rate, loops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::pattern::PatternStep;
    use crate::sequencer::MemorySink;
    use crate::voices::DrumVoice;

    fn config() -> EngineConfig {
        EngineConfig::default().with_sample_rate(8000)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = BeatEngine::new(config().with_sample_rate(0), MemorySink::new());
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::InvalidSampleRate(0)))
        ));
    }

    #[test]
    fn test_lazy_engine_starts_empty() {
        let engine = BeatEngine::new(config().with_pregenerate(false), MemorySink::new()).unwrap();
        assert!(engine.cache().is_empty());
        assert_eq!(engine.state(), TransportState::Stopped);
        assert_eq!(engine.beat_position(), None);
    }

    #[test]
    fn test_transport_controls() {
        let engine = BeatEngine::new(config(), MemorySink::new()).unwrap();
        engine.play(BeatPattern::empty(60.0, 8).unwrap());
        assert!(engine.is_playing());
        assert_eq!(engine.beat_position().unwrap().step, 0);

        engine.pause();
        assert_eq!(engine.state(), TransportState::Paused);
        engine.resume();
        assert!(engine.is_playing());

        engine.update_pattern(BeatPattern::empty(90.0, 4).unwrap());
        assert_eq!(engine.pattern().unwrap().len(), 4);

        engine.stop();
        assert_eq!(engine.state(), TransportState::Stopped);
        assert!(engine.pattern().is_none());
    }

    #[test]
    fn test_set_effects_rebuilds_cache() {
        let mut engine = BeatEngine::new(config(), MemorySink::new()).unwrap();
        let dry = engine.cache().get(DrumVoice::Snare, 127, 8000).unwrap();

        engine.set_effects(EffectChainConfig::roomy()).unwrap();
        let wet = engine.cache().get(DrumVoice::Snare, 127, 8000).unwrap();
        assert!(!Arc::ptr_eq(&dry, &wet));
        assert_eq!(engine.config().effects, EffectChainConfig::roomy());
    }

    #[test]
    fn test_set_effects_drops_old_buffers_first() {
        let sink = MemorySink::new();
        let mut engine = BeatEngine::new(config().with_pregenerate(false), sink.clone()).unwrap();
        let dry = engine.cache().pregenerate(DrumVoice::Kick, 127, 8000).unwrap();

        engine.set_effects(EffectChainConfig::punchy()).unwrap();
        assert!(engine.cache().is_empty());

        // The next hit misses and is rendered with the new chain
        let mut pattern = BeatPattern::empty(120.0, 4).unwrap();
        pattern.set_step(0, PatternStep::of(&[(DrumVoice::Kick, 1.0)])).unwrap();
        engine.play(pattern);
        engine.stop();
        let played = sink.played();
        assert_eq!(played.len(), 1);
        assert!(!Arc::ptr_eq(&played[0].buffer, &dry));
        assert_eq!(engine.cache().stats().syntheses, 2);
    }

    #[test]
    fn test_bounce_uses_engine_rate() {
        let engine = BeatEngine::new(config(), MemorySink::new()).unwrap();
        let mut pattern = BeatPattern::empty(120.0, 4).unwrap();
        pattern
            .set_step(0, PatternStep::of(&[(DrumVoice::Hihat, 0.5)]))
            .unwrap();
        let mix = engine.bounce(&pattern, 1).unwrap();
        assert_eq!(mix.sample_rate(), 8000);
        assert!(mix.peak() > 0.0);
    }
}
