//! Procedural drum voices.
//!
//! Every voice is synthesized from scratch: oscillators for the tonal body,
//! noise for the attack and the cymbal wash, and exponential envelopes for the
//! shape. `DrumSynth` is the factory that validates input, runs the voice
//! algorithm and applies the shared finishing steps:
//!
//! 1. boundary fades (0.5 ms in, up to 3 ms out)
//! 2. peak normalization to 1.0
//! 3. velocity gain `0.1 + velocity / 127 * 0.9`
//!
//! so the peak of every buffer is exactly its velocity gain.
//!
//! # Examples
//!
//! ```
//! use beatcoach::{DrumSynth, DrumVoice, SynthesisParams};
//!
//! let synth = DrumSynth::new();
//! let params = SynthesisParams::for_voice(DrumVoice::Kick, 127, 44100).unwrap();
//! let kick = synth.synthesize(DrumVoice::Kick, &params);
//!
//! assert_eq!(kick.len(), 17640);
//! assert!((kick.peak() - 1.0).abs() < 1e-6);
//! ```

mod common;
mod crash;
mod hihat;
mod kick;
mod ride;
mod rimshot;
mod snare;
mod tom;

use crate::buffer::SampleBuffer;
use crate::error::SynthError;
use crate::noise::NoiseBank;
use common::VoiceContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest accepted MIDI-style velocity.
pub const MAX_VELOCITY: u8 = 127;

/// Longest buffer a voice may be asked for.
pub const MAX_DURATION_SECONDS: f64 = 10.0;

/// Highest accepted sample rate.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Amplitude multiplier for a velocity.
///
/// Velocity 0 is still audible at 10% and velocity 127 is exactly unity.
///
/// # Examples
///
/// ```
/// use beatcoach::velocity_gain;
///
/// assert_eq!(velocity_gain(127), 1.0);
/// assert!((velocity_gain(0) - 0.1).abs() < 1e-12);
/// ```
pub fn velocity_gain(velocity: u8) -> f64 {
    0.1 + f64::from(velocity.min(MAX_VELOCITY)) / 127.0 * 0.9
}

/// The percussion voices the synthesizer knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrumVoice {
    Kick,
    Snare,
    Hihat,
    OpenHihat,
    Crash,
    Tom,
    Ride,
    Rimshot,
}

impl DrumVoice {
    /// Every voice, in a stable order.
    pub const ALL: [DrumVoice; 8] = [
        DrumVoice::Kick,
        DrumVoice::Snare,
        DrumVoice::Hihat,
        DrumVoice::OpenHihat,
        DrumVoice::Crash,
        DrumVoice::Tom,
        DrumVoice::Ride,
        DrumVoice::Rimshot,
    ];

    /// The identifier used in pattern documents and cache keys.
    pub fn name(self) -> &'static str {
        match self {
            DrumVoice::Kick => "kick",
            DrumVoice::Snare => "snare",
            DrumVoice::Hihat => "hihat",
            DrumVoice::OpenHihat => "openHihat",
            DrumVoice::Crash => "crash",
            DrumVoice::Tom => "tom",
            DrumVoice::Ride => "ride",
            DrumVoice::Rimshot => "rimshot",
        }
    }

    /// Natural length of the voice in seconds.
    pub fn default_duration(self) -> f64 {
        match self {
            DrumVoice::Kick => 0.4,
            DrumVoice::Snare => 0.1,
            DrumVoice::Hihat => 0.1,
            DrumVoice::OpenHihat => 0.5,
            DrumVoice::Crash => 1.0,
            DrumVoice::Tom => 0.25,
            DrumVoice::Ride => 0.4,
            DrumVoice::Rimshot => 0.05,
        }
    }

    /// Tuning of the voice's tonal layer in Hz.
    pub fn default_fundamental(self) -> f64 {
        match self {
            DrumVoice::Kick => 45.0,
            DrumVoice::Snare => 200.0,
            DrumVoice::Hihat | DrumVoice::OpenHihat => 400.0,
            DrumVoice::Crash => 300.0,
            DrumVoice::Tom => 120.0,
            DrumVoice::Ride => 5000.0,
            DrumVoice::Rimshot => 800.0,
        }
    }

    /// Position of the voice in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DrumVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DrumVoice {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrumVoice::ALL
            .into_iter()
            .find(|voice| voice.name() == s)
            .ok_or_else(|| SynthError::UnknownVoice(s.to_string()))
    }
}

/// Validated input to a single synthesis call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParams {
    sample_rate: u32,
    duration_seconds: f64,
    velocity: u8,
    fundamental_hz: Option<f64>,
}

impl SynthesisParams {
    /// Validates the numeric inputs.
    ///
    /// # Errors
    ///
    /// Returns a `SynthError` for a sample rate of 0 or above
    /// `MAX_SAMPLE_RATE`, a duration that is not in (0, `MAX_DURATION_SECONDS`],
    /// or a velocity above 127.
    pub fn new(sample_rate: u32, duration_seconds: f64, velocity: u32) -> Result<Self, SynthError> {
        if sample_rate == 0 || sample_rate > MAX_SAMPLE_RATE {
            return Err(SynthError::InvalidSampleRate(sample_rate));
        }
        if !duration_seconds.is_finite()
            || duration_seconds <= 0.0
            || duration_seconds > MAX_DURATION_SECONDS
        {
            return Err(SynthError::InvalidDuration(duration_seconds));
        }
        let velocity = u8::try_from(velocity)
            .ok()
            .filter(|v| *v <= MAX_VELOCITY)
            .ok_or(SynthError::VelocityOutOfRange(velocity))?;

        Ok(Self {
            sample_rate,
            duration_seconds,
            velocity,
            fundamental_hz: None,
        })
    }

    /// Parameters using the voice's natural duration.
    pub fn for_voice(voice: DrumVoice, velocity: u32, sample_rate: u32) -> Result<Self, SynthError> {
        Self::new(sample_rate, voice.default_duration(), velocity)
    }

    /// Overrides the voice's default tuning.
    ///
    /// # Errors
    ///
    /// `InvalidFundamental` unless `0 < hz < sample_rate / 2`.
    pub fn with_fundamental(mut self, hz: f64) -> Result<Self, SynthError> {
        if !hz.is_finite() || hz <= 0.0 || hz >= f64::from(self.sample_rate) / 2.0 {
            return Err(SynthError::InvalidFundamental(hz));
        }
        self.fundamental_hz = Some(hz);
        Ok(self)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn fundamental_hz(&self) -> Option<f64> {
        self.fundamental_hz
    }

    /// Number of samples the synthesized buffer will hold (at least one).
    pub fn sample_count(&self) -> usize {
        ((self.duration_seconds * f64::from(self.sample_rate)).round() as usize).max(1)
    }

    /// Noise seed derived from every input, so equal inputs give equal buffers.
    pub fn seed(&self, voice: DrumVoice) -> u64 {
        let fundamental = self.fundamental_hz.map_or(0, f64::to_bits);
        [
            voice.index() as u64,
            u64::from(self.velocity),
            u64::from(self.sample_rate),
            self.duration_seconds.to_bits(),
            fundamental,
        ]
        .into_iter()
        .fold(0x9e37_79b9_7f4a_7c15, |acc, part| splitmix(acc ^ part))
    }
}

fn splitmix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// The synthesizer factory.
///
/// Owns the shared noise bank, so it is cheap to call repeatedly but should be
/// constructed once and shared.
#[derive(Debug, Default)]
pub struct DrumSynth {
    bank: NoiseBank,
}

impl DrumSynth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesizes one hit of `voice`.
    ///
    /// Infallible: every failure mode is ruled out when `params` is built.
    pub fn synthesize(&self, voice: DrumVoice, params: &SynthesisParams) -> SampleBuffer {
        let ctx = VoiceContext::new(voice, params, &self.bank);
        let raw = match voice {
            DrumVoice::Kick => kick::render(&ctx),
            DrumVoice::Snare => snare::render(&ctx),
            DrumVoice::Hihat => hihat::render(&ctx, hihat::Hat::Closed),
            DrumVoice::OpenHihat => hihat::render(&ctx, hihat::Hat::Open),
            DrumVoice::Crash => crash::render(&ctx),
            DrumVoice::Tom => tom::render(&ctx),
            DrumVoice::Ride => ride::render(&ctx),
            DrumVoice::Rimshot => rimshot::render(&ctx),
        };

        let mut buffer = SampleBuffer::from_f64(raw, params.sample_rate());
        buffer.limit_peak();
        buffer.apply_fades();
        buffer.normalize_to(1.0);
        buffer.scale(velocity_gain(params.velocity()) as f32);
        buffer
    }

    /// Synthesizes a voice given by name.
    ///
    /// # Errors
    ///
    /// `SynthError::UnknownVoice` if `name` is not a known voice. No default
    /// voice is ever substituted.
    pub fn synthesize_named(
        &self,
        name: &str,
        params: &SynthesisParams,
    ) -> Result<SampleBuffer, SynthError> {
        let voice = name.parse::<DrumVoice>()?;
        Ok(self.synthesize(voice, params))
    }
}
