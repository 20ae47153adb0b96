//! Beatcoach - procedural drum machine for rhythm-driven workouts
//!
//! Drum sounds are synthesized from oscillators, noise and envelopes rather
//! than loaded from samples, memoized per voice, velocity and sample rate,
//! and played back by a drift-compensated step sequencer. The sequencer
//! publishes its beat position so a pose-detection loop running on its own
//! schedule can score movement against the music.
//!
//! # Examples
//!
//! ```
//! use beatcoach::{DrumSynth, DrumVoice, SynthesisParams};
//!
//! let params = SynthesisParams::for_voice(DrumVoice::Snare, 100, 44100).unwrap();
//! let snare = DrumSynth::new().synthesize(DrumVoice::Snare, &params);
//! assert!(snare.peak() <= 1.0);
//! ```

pub mod buffer;
pub mod cache;
pub mod config;
pub mod detection;
pub mod effects;
pub mod engine;
pub mod envelopes;
pub mod error;
pub mod filters;
pub mod noise;
pub mod oscillators;
pub mod pattern;
pub mod render;
pub mod sequencer;
pub mod signal;
pub mod voices;

// Re-export commonly used types at the crate root
pub use buffer::SampleBuffer;
pub use cache::{CacheKey, CacheStats, SampleCache};
pub use config::{CacheMissPolicy, EngineConfig};
pub use effects::EffectChainConfig;
pub use engine::BeatEngine;
pub use envelopes::{Adsr, Curve, ExpDecay};
pub use error::{
    ConfigError, EngineError, GuideError, PatternError, PoseError, SinkError, SynthError,
};
pub use filters::{Biquad, FilterType, OnePole};
pub use noise::{PinkNoise, WhiteNoise};
pub use oscillators::{FmOperator, Oscillator, SineOscillator};
pub use pattern::{BeatPattern, DrumHit, PatternDocument, PatternStep, TimeSignature};
pub use signal::Signal;
pub use voices::{velocity_gain, DrumSynth, DrumVoice, SynthesisParams};
