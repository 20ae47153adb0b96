//! The step grid the sequencer plays and the editor mutates.
//!
//! A pattern is timing-aware only through its tempo: every step is one
//! sixteenth note (`STEPS_PER_BEAT` steps per beat), and swing is stored as a
//! percentage that the scheduler turns into a delay on odd steps.
//!
//! `PatternDocument` is the persisted JSON form, including the legacy flat
//! number-array format.

mod beat;
mod document;
mod step;

pub use beat::{
    step_interval_for, BeatPattern, TimeSignature, MAX_BPM, MAX_STEPS, MIN_BPM, STEPS_PER_BEAT,
    SWING_DEPTH,
};
pub use document::{legacy_hit, PatternDocument, StepList, DEFAULT_BPM, DEFAULT_LENGTH};
pub use step::{DrumHit, PatternStep, MAX_HIT_OFFSET_SECONDS};
