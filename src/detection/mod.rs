//! Plumbing between the pose estimator and per-exercise scoring.
//!
//! The estimator itself and the exercise-specific detectors live outside
//! this crate. What lives here is the contract between them: typed poses in,
//! `Detection`s out, with the sequencer's beat position attached so
//! detectors can score against the matching guide keyframe.

mod detector;
mod guide;
mod pose;

pub use detector::{Detection, DetectionLoop, DetectionThrottle, Detector};
pub use guide::{ExerciseBinding, GuideData, GuideFrame, GuideRegistry};
pub use pose::{Keypoint, LANDMARK_COUNT, Landmark, Pose};
