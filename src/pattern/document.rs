//! Persisted pattern documents.

use super::beat::{BeatPattern, TimeSignature, MAX_BPM, MAX_STEPS, MIN_BPM};
use super::{DrumHit, PatternStep};
use crate::error::PatternError;
use crate::voices::DrumVoice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tempo used when a document has none.
pub const DEFAULT_BPM: f64 = 120.0;

/// Step count used when a document has neither steps nor a length.
pub const DEFAULT_LENGTH: usize = 16;

/// The `pattern` field of a document, in either format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepList {
    /// One array of hits per step.
    Structured(Vec<PatternStep>),
    /// Older documents: one voice code per step, see `legacy_hit`.
    Legacy(Vec<i64>),
}

impl Default for StepList {
    fn default() -> Self {
        StepList::Structured(Vec::new())
    }
}

impl StepList {
    /// Converts to structured steps. Unknown legacy codes become rests.
    pub fn into_steps(self) -> Vec<PatternStep> {
        match self {
            StepList::Structured(steps) => steps,
            StepList::Legacy(codes) => codes
                .into_iter()
                .enumerate()
                .map(|(index, code)| match legacy_hit(code) {
                    Some(hit) => PatternStep::from_hits([hit]),
                    None => {
                        if code >= 0 {
                            log::warn!("unknown legacy step code {} at step {}, using a rest", code, index);
                        }
                        PatternStep::rest()
                    }
                })
                .collect(),
        }
    }
}

/// The fixed voice table of the legacy number-array format.
///
/// | code | voice | volume |
/// |------|-------|--------|
/// | 0    | kick  | 1.00   |
/// | 1    | hihat | 0.45   |
/// | 2    | snare | 0.80   |
/// | 3    | hihat | 0.40   |
///
/// Negative codes are rests; any other code is unknown.
pub fn legacy_hit(code: i64) -> Option<DrumHit> {
    let (voice, volume) = match code {
        0 => (DrumVoice::Kick, 1.0),
        1 => (DrumVoice::Hihat, 0.45),
        2 => (DrumVoice::Snare, 0.80),
        3 => (DrumVoice::Hihat, 0.40),
        _ => return None,
    };
    Some(DrumHit::new(voice, volume))
}

/// A pattern as stored by the editor.
///
/// Every field but `pattern` may be missing; `into_pattern` fills the gaps
/// with defaults and clamps out-of-range values rather than rejecting the
/// document.
///
/// # Examples
///
/// ```
/// use beatcoach::{DrumVoice, PatternDocument};
///
/// let doc = PatternDocument::from_json(r#"{"name": "basic", "pattern": [0, 1, 2, 3]}"#).unwrap();
/// let pattern = doc.into_pattern().unwrap();
///
/// assert_eq!(pattern.bpm(), 120.0);
/// assert_eq!(pattern.len(), 4);
/// assert!(pattern.step(2).unwrap().hit(DrumVoice::Snare).is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(default)]
    pub pattern: StepList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<TimeSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PatternDocument {
    /// Wraps a pattern in a new document with a fresh id and timestamps.
    pub fn from_pattern(pattern: &BeatPattern, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            bpm: Some(pattern.bpm()),
            pattern: StepList::Structured(pattern.steps().to_vec()),
            time_signature: Some(pattern.time_signature()),
            swing: Some(pattern.swing_percent()),
            length: Some(pattern.len()),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PatternError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replaces the stored pattern after an edit and bumps `updated_at`.
    pub fn update(&mut self, pattern: &BeatPattern) {
        let created_at = self.created_at;
        *self = Self {
            id: std::mem::take(&mut self.id),
            name: std::mem::take(&mut self.name),
            ..Self::from_pattern(pattern, "")
        };
        self.created_at = created_at.or(self.updated_at);
    }

    /// Builds the playable pattern, upconverting the legacy format and
    /// defaulting or clamping malformed fields.
    ///
    /// # Errors
    ///
    /// Never for malformed values; only if the result would still be invalid,
    /// which the clamping rules out.
    pub fn into_pattern(self) -> Result<BeatPattern, PatternError> {
        let name = self.name;
        let bpm = match self.bpm {
            Some(bpm) if bpm.is_finite() => {
                let clamped = bpm.clamp(MIN_BPM, MAX_BPM);
                if clamped != bpm {
                    log::warn!("pattern '{}': bpm {} clamped to {}", name, bpm, clamped);
                }
                clamped
            }
            Some(bpm) => {
                log::warn!("pattern '{}': bpm {} replaced by {}", name, bpm, DEFAULT_BPM);
                DEFAULT_BPM
            }
            None => DEFAULT_BPM,
        };

        let swing = self.swing.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&swing) {
            log::warn!("pattern '{}': swing {} clamped", name, swing);
        }

        let time_signature = match self.time_signature {
            Some(signature) if signature.is_valid() => signature,
            Some(signature) => {
                log::warn!("pattern '{}': invalid time signature {}, using 4/4", name, signature);
                TimeSignature::COMMON
            }
            None => TimeSignature::COMMON,
        };

        let mut steps = self.pattern.into_steps();
        let len = match self.length {
            Some(0) | None if steps.is_empty() => {
                log::warn!("pattern '{}' has no steps, using {} rests", name, DEFAULT_LENGTH);
                DEFAULT_LENGTH
            }
            Some(0) | None => steps.len(),
            Some(length) => length,
        };
        if len > MAX_STEPS {
            log::warn!("pattern '{}': {} steps truncated to {}", name, len, MAX_STEPS);
        }
        steps.resize(len.min(MAX_STEPS), PatternStep::rest());

        Ok(BeatPattern::new(bpm, steps)?
            .with_swing(swing)
            .with_time_signature(time_signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices(step: &PatternStep) -> Vec<(DrumVoice, f64)> {
        step.hits().iter().map(|h| (h.voice(), h.volume())).collect()
    }

    #[test]
    fn test_legacy_upconversion() {
        let doc = PatternDocument::from_json(r#"{"pattern": [0, 1, 2, 3]}"#).unwrap();
        assert!(matches!(doc.pattern, StepList::Legacy(_)));

        let pattern = doc.into_pattern().unwrap();
        let converted: Vec<_> = pattern.steps().iter().map(voices).collect();
        assert_eq!(
            converted,
            vec![
                vec![(DrumVoice::Kick, 1.0)],
                vec![(DrumVoice::Hihat, 0.45)],
                vec![(DrumVoice::Snare, 0.80)],
                vec![(DrumVoice::Hihat, 0.40)],
            ]
        );
    }

    #[test]
    fn test_unknown_legacy_codes_are_rests() {
        let pattern = PatternDocument::from_json(r#"{"pattern": [0, 9, -1, 2]}"#)
            .unwrap()
            .into_pattern()
            .unwrap();
        assert_eq!(pattern.len(), 4);
        assert!(pattern.step(1).unwrap().is_rest());
        assert!(pattern.step(2).unwrap().is_rest());
    }

    #[test]
    fn test_missing_fields_defaulted() {
        let pattern = PatternDocument::from_json(r#"{"pattern": [[{"type":"kick","volume":1}]]}"#)
            .unwrap()
            .into_pattern()
            .unwrap();
        assert_eq!(pattern.bpm(), DEFAULT_BPM);
        assert_eq!(pattern.swing_percent(), 0.0);
        assert_eq!(pattern.time_signature(), TimeSignature::COMMON);
        assert_eq!(pattern.len(), 1);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let json = r#"{"bpm": 999, "swing": 140, "timeSignature": [4, 3], "pattern": [0]}"#;
        let pattern = PatternDocument::from_json(json).unwrap().into_pattern().unwrap();
        assert_eq!(pattern.bpm(), MAX_BPM);
        assert_eq!(pattern.swing_percent(), 100.0);
        assert_eq!(pattern.time_signature(), TimeSignature::COMMON);
    }

    #[test]
    fn test_length_pads_and_truncates() {
        let padded = PatternDocument::from_json(r#"{"pattern": [0, 2], "length": 8}"#)
            .unwrap()
            .into_pattern()
            .unwrap();
        assert_eq!(padded.len(), 8);
        assert!(padded.step(7).unwrap().is_rest());

        let truncated = PatternDocument::from_json(r#"{"pattern": [0, 2, 0, 2], "length": 2}"#)
            .unwrap()
            .into_pattern()
            .unwrap();
        assert_eq!(truncated.len(), 2);

        let empty = PatternDocument::from_json(r#"{"name": "blank"}"#)
            .unwrap()
            .into_pattern()
            .unwrap();
        assert_eq!(empty.len(), DEFAULT_LENGTH);
    }

    #[test]
    fn test_unknown_voice_is_an_error() {
        let result = PatternDocument::from_json(r#"{"pattern": [[{"type":"cowbell","volume":1}]]}"#);
        assert!(matches!(result, Err(PatternError::Json(_))));
    }

    #[test]
    fn test_round_trip() {
        let mut original = BeatPattern::empty(96.0, 8).unwrap().with_swing(25.0);
        original.toggle(0, DrumVoice::Kick, 1.0).unwrap();
        original
            .set_step(3, PatternStep::from_hits([DrumHit::new(DrumVoice::Rimshot, 0.6).with_offset(0.01)]))
            .unwrap();

        let doc = PatternDocument::from_pattern(&original, "groove");
        assert_eq!(doc.id.len(), 36);
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"timeSignature\""));

        let restored = PatternDocument::from_json(&json).unwrap();
        assert_eq!(restored, doc);
        assert_eq!(restored.into_pattern().unwrap(), original);
    }

    #[test]
    fn test_update_keeps_identity() {
        let pattern = BeatPattern::empty(120.0, 4).unwrap();
        let mut doc = PatternDocument::from_pattern(&pattern, "warmup");
        let id = doc.id.clone();
        let created = doc.created_at;

        let mut edited = pattern.clone();
        edited.resize(8).unwrap();
        doc.update(&edited);

        assert_eq!(doc.id, id);
        assert_eq!(doc.name, "warmup");
        assert_eq!(doc.created_at, created);
        assert_eq!(doc.length, Some(8));
    }
}
