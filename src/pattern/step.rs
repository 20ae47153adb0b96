//! Voices triggered together on one sequencer tick.

use crate::voices::DrumVoice;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest delay a hit may have after its step's grid time.
pub const MAX_HIT_OFFSET_SECONDS: f64 = 2.0;

/// One voice trigger within a step.
///
/// Serialized as `{"type": "kick", "volume": 1.0, "timeOffset": 0.01}`.
/// Every way of building a hit, deserialization included, clamps the volume
/// to [0, 1] and the offset to [0, `MAX_HIT_OFFSET_SECONDS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "HitRecord", into = "HitRecord")]
pub struct DrumHit {
    voice: DrumVoice,
    volume: f64,
    time_offset: Option<f64>,
}

impl DrumHit {
    pub fn new(voice: DrumVoice, volume: f64) -> Self {
        Self {
            voice,
            volume: clamp_volume(volume),
            time_offset: None,
        }
    }

    /// Delays the hit by `seconds` after its step. Zero, negative or
    /// non-finite offsets are dropped; long ones are capped.
    pub fn with_offset(mut self, seconds: f64) -> Self {
        self.time_offset = clamp_offset(seconds);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = clamp_volume(volume);
        self
    }

    pub fn voice(&self) -> DrumVoice {
        self.voice
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Extra delay after the step's grid time, in seconds.
    pub fn time_offset(&self) -> Option<f64> {
        self.time_offset
    }

    /// A hit with zero volume is kept in the pattern but never played.
    pub fn is_audible(&self) -> bool {
        self.volume > 0.0
    }

    pub fn offset_seconds(&self) -> f64 {
        self.time_offset.unwrap_or(0.0)
    }

    pub fn offset(&self) -> Duration {
        Duration::try_from_secs_f64(self.offset_seconds()).unwrap_or_default()
    }
}

fn clamp_volume(volume: f64) -> f64 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn clamp_offset(seconds: f64) -> Option<f64> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    if seconds > MAX_HIT_OFFSET_SECONDS {
        log::warn!(
            "hit offset of {} s capped to {} s",
            seconds,
            MAX_HIT_OFFSET_SECONDS
        );
        return Some(MAX_HIT_OFFSET_SECONDS);
    }
    Some(seconds)
}

/// Wire form of a hit, before clamping.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HitRecord {
    #[serde(rename = "type")]
    voice: DrumVoice,
    volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_offset: Option<f64>,
}

impl From<HitRecord> for DrumHit {
    fn from(record: HitRecord) -> Self {
        let hit = DrumHit::new(record.voice, record.volume);
        match record.time_offset {
            Some(seconds) => hit.with_offset(seconds),
            None => hit,
        }
    }
}

impl From<DrumHit> for HitRecord {
    fn from(hit: DrumHit) -> Self {
        HitRecord {
            voice: hit.voice,
            volume: hit.volume,
            time_offset: hit.time_offset,
        }
    }
}

/// The hits fired on one tick. An empty step is a rest.
///
/// Each voice appears at most once; inserting a voice that is already present
/// replaces its hit in place.
///
/// # Examples
///
/// ```
/// use beatcoach::{DrumHit, DrumVoice, PatternStep};
///
/// let mut step = PatternStep::rest();
/// step.insert(DrumHit::new(DrumVoice::Kick, 1.0));
/// step.insert(DrumHit::new(DrumVoice::Hihat, 0.5));
/// step.insert(DrumHit::new(DrumVoice::Kick, 0.7));
///
/// assert_eq!(step.len(), 2);
/// assert_eq!(step.hit(DrumVoice::Kick).unwrap().volume(), 0.7);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<DrumHit>", into = "Vec<DrumHit>")]
pub struct PatternStep {
    hits: Vec<DrumHit>,
}

impl PatternStep {
    pub fn rest() -> Self {
        Self::default()
    }

    /// Builds a step from hits, keeping the last hit given for each voice.
    pub fn from_hits(hits: impl IntoIterator<Item = DrumHit>) -> Self {
        let mut step = Self::rest();
        for hit in hits {
            step.insert(hit);
        }
        step
    }

    /// Shorthand for a step of `(voice, volume)` pairs.
    pub fn of(hits: &[(DrumVoice, f64)]) -> Self {
        Self::from_hits(hits.iter().map(|&(voice, volume)| DrumHit::new(voice, volume)))
    }

    pub fn insert(&mut self, hit: DrumHit) {
        match self.hits.iter_mut().find(|h| h.voice == hit.voice) {
            Some(existing) => *existing = hit,
            None => self.hits.push(hit),
        }
    }

    pub fn remove(&mut self, voice: DrumVoice) -> Option<DrumHit> {
        let index = self.hits.iter().position(|h| h.voice == voice)?;
        Some(self.hits.remove(index))
    }

    /// Removes the voice if present, otherwise adds it at `volume`.
    /// Returns whether the voice is present afterwards.
    pub fn toggle(&mut self, voice: DrumVoice, volume: f64) -> bool {
        if self.remove(voice).is_some() {
            false
        } else {
            self.insert(DrumHit::new(voice, volume));
            true
        }
    }

    pub fn hit(&self, voice: DrumVoice) -> Option<&DrumHit> {
        self.hits.iter().find(|h| h.voice == voice)
    }

    /// Changes the offset of a voice already on this step. Returns whether
    /// the voice was present.
    pub fn set_offset(&mut self, voice: DrumVoice, seconds: f64) -> bool {
        match self.hits.iter_mut().find(|h| h.voice == voice) {
            Some(hit) => {
                *hit = hit.with_offset(seconds);
                true
            }
            None => false,
        }
    }

    pub fn hits(&self) -> &[DrumHit] {
        &self.hits
    }

    /// Hits with a volume above zero.
    pub fn audible(&self) -> impl Iterator<Item = &DrumHit> {
        self.hits.iter().filter(|h| h.is_audible())
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    pub fn is_rest(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl From<Vec<DrumHit>> for PatternStep {
    fn from(hits: Vec<DrumHit>) -> Self {
        Self::from_hits(hits)
    }
}

impl From<PatternStep> for Vec<DrumHit> {
    fn from(step: PatternStep) -> Self {
        step.hits
    }
}
