//! Keyframe guides that exercises animate in time with the beat.

use super::Keypoint;
use crate::error::GuideError;
use crate::pattern::{BeatPattern, STEPS_PER_BEAT};
use crate::sequencer::BeatPosition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Body keypoints for one guide keyframe.
pub type GuideFrame = Vec<Keypoint>;

/// A looped keyframe animation timed in beats.
///
/// # Examples
///
/// ```
/// use beatcoach::detection::GuideData;
/// use beatcoach::sequencer::BeatPosition;
///
/// let guide = GuideData::from_json(r#"{
///     "totalBeats": 2,
///     "framesPerBeat": 4,
///     "frames": [[], [], [], [], [], [], [], []],
///     "markedFrameIndices": [0, 4]
/// }"#).unwrap();
///
/// // Step 6 is halfway through the second beat
/// let position = BeatPosition { step: 6, progress: 0.0 };
/// assert_eq!(guide.frame_index_at(position), Some(6));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideData {
    pub total_beats: u32,
    pub frames_per_beat: u32,
    pub frames: Vec<GuideFrame>,
    #[serde(default)]
    pub marked_frame_indices: Vec<usize>,
}

impl GuideData {
    /// Parses and validates guide data.
    pub fn from_json(json: &str) -> Result<Self, GuideError> {
        let guide: GuideData = serde_json::from_str(json)?;
        guide.validate()?;
        Ok(guide)
    }

    pub fn validate(&self) -> Result<(), GuideError> {
        if self.frames.is_empty() {
            return Err(GuideError::NoFrames);
        }
        if self.frames_per_beat == 0 {
            return Err(GuideError::ZeroFramesPerBeat);
        }
        let len = self.frames.len();
        match self.marked_frame_indices.iter().find(|&&i| i >= len) {
            Some(&index) => Err(GuideError::MarkedFrameOutOfRange { index, len }),
            None => Ok(()),
        }
    }

    /// Frames in one loop of the animation.
    pub fn loop_frames(&self) -> usize {
        let by_beats = self.total_beats as usize * self.frames_per_beat as usize;
        if by_beats == 0 {
            self.frames.len()
        } else {
            by_beats.min(self.frames.len())
        }
    }

    /// The keyframe to show at a sequencer position.
    ///
    /// Steps are sixteenth notes, so the beat is `(step + progress) / 4`.
    /// The animation loops every `total_beats` beats.
    pub fn frame_index_at(&self, position: BeatPosition) -> Option<usize> {
        let frames = self.loop_frames();
        if frames == 0 || self.frames_per_beat == 0 {
            return None;
        }
        let beats = (position.step as f64 + position.progress) / f64::from(STEPS_PER_BEAT);
        let frame = (beats * f64::from(self.frames_per_beat)).floor() as usize;
        Some(frame % frames)
    }

    pub fn frame_at(&self, position: BeatPosition) -> Option<&GuideFrame> {
        self.frame_index_at(position).and_then(|i| self.frames.get(i))
    }

    /// Whether a keyframe is one of the poses the user is scored against.
    pub fn is_marked(&self, index: usize) -> bool {
        self.marked_frame_indices.contains(&index)
    }
}

/// Guides keyed by exercise identifier, populated up front.
#[derive(Debug, Clone, Default)]
pub struct GuideRegistry {
    guides: HashMap<String, Arc<GuideData>>,
}

impl GuideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a guide, replacing any earlier one for the same exercise.
    pub fn register(&mut self, exercise_id: impl Into<String>, guide: GuideData) -> Result<(), GuideError> {
        guide.validate()?;
        let exercise_id = exercise_id.into();
        if self.guides.insert(exercise_id.clone(), Arc::new(guide)).is_some() {
            log::warn!("replaced guide for exercise '{}'", exercise_id);
        }
        Ok(())
    }

    pub fn register_json(&mut self, exercise_id: impl Into<String>, json: &str) -> Result<(), GuideError> {
        self.register(exercise_id, GuideData::from_json(json)?)
    }

    pub fn get(&self, exercise_id: &str) -> Option<Arc<GuideData>> {
        self.guides.get(exercise_id).cloned()
    }

    pub fn contains(&self, exercise_id: &str) -> bool {
        self.guides.contains_key(exercise_id)
    }

    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }
}

/// The beat and optional guide animation an exercise plays along to.
#[derive(Debug, Clone)]
pub struct ExerciseBinding {
    pub exercise_id: String,
    pub pattern: BeatPattern,
    pub guide: Option<Arc<GuideData>>,
}

impl ExerciseBinding {
    /// Binds `pattern` to the exercise, looking its guide up in `registry`.
    pub fn resolve(exercise_id: impl Into<String>, pattern: BeatPattern, registry: &GuideRegistry) -> Self {
        let exercise_id = exercise_id.into();
        let guide = registry.get(&exercise_id);
        if guide.is_none() {
            log::debug!("no guide registered for exercise '{}'", exercise_id);
        }
        Self {
            exercise_id,
            pattern,
            guide,
        }
    }

    pub fn guide_frame_at(&self, position: BeatPosition) -> Option<&GuideFrame> {
        self.guide.as_deref().and_then(|g| g.frame_at(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guide(total_beats: u32, frames_per_beat: u32, frames: usize) -> GuideData {
        GuideData {
            total_beats,
            frames_per_beat,
            frames: vec![Vec::new(); frames],
            marked_frame_indices: Vec::new(),
        }
    }

    fn at(step: usize, progress: f64) -> BeatPosition {
        BeatPosition { step, progress }
    }

    #[test]
    fn test_frame_mapping_follows_progress() {
        let guide = guide(4, 2, 8);
        assert_eq!(guide.frame_index_at(at(0, 0.0)), Some(0));
        // Half a beat in
        assert_eq!(guide.frame_index_at(at(2, 0.0)), Some(1));
        assert_eq!(guide.frame_index_at(at(1, 0.99)), Some(0));
        assert_eq!(guide.frame_index_at(at(3, 0.5)), Some(1));
        assert_eq!(guide.frame_index_at(at(15, 0.9)), Some(7));
    }

    #[test]
    fn test_frame_mapping_loops() {
        let guide = guide(2, 2, 4);
        // Beat 2 wraps to the first frame
        assert_eq!(guide.frame_index_at(at(8, 0.0)), Some(0));
        assert_eq!(guide.frame_index_at(at(14, 0.0)), Some(3));
    }

    #[test]
    fn test_extra_frames_beyond_beats_unused() {
        let guide = guide(1, 2, 10);
        assert_eq!(guide.loop_frames(), 2);
        assert_eq!(guide.frame_index_at(at(4, 0.0)), Some(0));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(guide(1, 1, 0).validate(), Err(GuideError::NoFrames)));
        assert!(matches!(guide(1, 0, 2).validate(), Err(GuideError::ZeroFramesPerBeat)));

        let mut marked = guide(1, 2, 2);
        marked.marked_frame_indices = vec![1, 2];
        assert!(matches!(
            marked.validate(),
            Err(GuideError::MarkedFrameOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_binding_resolves_from_registry() {
        let mut registry = GuideRegistry::new();
        registry.register("squat", guide(2, 2, 4)).unwrap();
        let pattern = BeatPattern::empty(100.0, 16).unwrap();

        let squat = ExerciseBinding::resolve("squat", pattern.clone(), &registry);
        assert!(squat.guide.is_some());
        assert!(squat.guide_frame_at(at(0, 0.0)).is_some());

        let lunge = ExerciseBinding::resolve("lunge", pattern, &registry);
        assert!(lunge.guide.is_none());
        assert!(lunge.guide_frame_at(at(0, 0.0)).is_none());
    }

    #[test]
    fn test_registry_rejects_invalid_guides() {
        let mut registry = GuideRegistry::new();
        assert!(registry.register_json("plank", "{not json").is_err());
        assert!(registry.register("plank", guide(1, 1, 0)).is_err());
        assert!(registry.is_empty());
    }
}
