//! Error types for synthesis, patterns, playback and pose input.

use thiserror::Error;

/// Errors raised while validating synthesis input.
///
/// Synthesis itself cannot fail once its parameters are validated, so every
/// variant here is reported before any samples are generated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    /// A voice name did not match any known drum voice.
    #[error("unknown drum voice: '{0}'")]
    UnknownVoice(String),

    /// MIDI-style velocity outside 0..=127.
    #[error("velocity {0} out of range (expected 0..=127)")]
    VelocityOutOfRange(u32),

    /// Duration was zero, negative, not finite or unreasonably long.
    #[error("invalid duration: {0} seconds")]
    InvalidDuration(f64),

    /// Sample rate of zero or beyond what any output device supports.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Fundamental frequency not positive or above Nyquist.
    #[error("invalid fundamental frequency: {0} Hz")]
    InvalidFundamental(f64),
}

/// Errors raised while building or editing beat patterns.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("bpm {0} out of range (expected 20..=300)")]
    InvalidBpm(f64),

    #[error("pattern has no steps")]
    EmptyPattern,

    #[error("step {step} out of range (pattern length is {len})")]
    StepOutOfRange { step: usize, len: usize },

    #[error("pattern length {0} exceeds the maximum of {max}", max = crate::pattern::MAX_STEPS)]
    TooManySteps(usize),

    #[error("invalid time signature {0}/{1}")]
    InvalidTimeSignature(u8, u8),

    #[error("malformed pattern document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by an audio output sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The output context is suspended or not yet started.
    #[error("audio output is not ready")]
    NotReady,

    #[error("audio device error: {0}")]
    Device(String),
}

/// Errors raised when converting raw pose estimator output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoseError {
    #[error("expected {expected} keypoints, got {actual}")]
    KeypointCount { expected: usize, actual: usize },
}

/// Errors raised while loading guide keyframe data.
#[derive(Debug, Error)]
pub enum GuideError {
    #[error("malformed guide data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("guide has no frames")]
    NoFrames,

    #[error("framesPerBeat must be positive")]
    ZeroFramesPerBeat,

    #[error("marked frame {index} out of range (guide has {len} frames)")]
    MarkedFrameOutOfRange { index: usize, len: usize },
}

/// Errors raised while loading or validating engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed engine config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("no velocity layers configured")]
    NoVelocityLayers,

    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// Errors raised while constructing a `BeatEngine`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("pregeneration failed: {0}")]
    Synth(#[from] SynthError),

    /// The transport thread could not be started.
    #[error("failed to spawn transport thread: {0}")]
    Spawn(#[from] std::io::Error),
}
