//! Body keypoints as reported by the pose estimator.

use crate::error::PoseError;
use serde::{Deserialize, Serialize};

/// Number of landmarks reported per body by the pose estimator.
pub const LANDMARK_COUNT: usize = 33;

/// One tracked body point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Estimator confidence that the point is in view, in [0, 1].
    #[serde(default)]
    pub visibility: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Distance to `other` in the image plane.
    pub fn distance_2d(&self, other: &Keypoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Keypoint) -> Keypoint {
        Keypoint {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
            visibility: self.visibility.min(other.visibility),
        }
    }
}

/// Index of each body point in a pose, as laid out by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl Landmark {
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Landmark::Nose,
        Landmark::LeftEyeInner,
        Landmark::LeftEye,
        Landmark::LeftEyeOuter,
        Landmark::RightEyeInner,
        Landmark::RightEye,
        Landmark::RightEyeOuter,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::MouthLeft,
        Landmark::MouthRight,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftPinky,
        Landmark::RightPinky,
        Landmark::LeftIndex,
        Landmark::RightIndex,
        Landmark::LeftThumb,
        Landmark::RightThumb,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
        Landmark::LeftHeel,
        Landmark::RightHeel,
        Landmark::LeftFootIndex,
        Landmark::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Landmark> {
        Self::ALL.get(index).copied()
    }
}

/// A full set of body landmarks for one video frame.
///
/// # Examples
///
/// ```
/// use beatcoach::detection::{Keypoint, Landmark, Pose};
///
/// let mut points = vec![Keypoint::default(); 33];
/// points[23] = Keypoint::new(0.4, 0.6, 0.0, 0.9);
/// let pose = Pose::try_from(points.as_slice()).unwrap();
/// assert_eq!(pose[Landmark::LeftHip].x, 0.4);
///
/// assert!(Pose::try_from(&points[..10]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    keypoints: [Keypoint; LANDMARK_COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; LANDMARK_COUNT]) -> Self {
        Self { keypoints }
    }

    pub fn get(&self, landmark: Landmark) -> &Keypoint {
        &self.keypoints[landmark.index()]
    }

    pub fn keypoints(&self) -> &[Keypoint; LANDMARK_COUNT] {
        &self.keypoints
    }

    /// Whether every listed landmark is at least `threshold` visible.
    pub fn all_visible(&self, landmarks: &[Landmark], threshold: f64) -> bool {
        landmarks
            .iter()
            .all(|&l| self.get(l).visibility >= threshold)
    }

    /// Angle at `vertex` between the segments to `a` and `b`, in degrees.
    pub fn angle(&self, a: Landmark, vertex: Landmark, b: Landmark) -> f64 {
        let (a, v, b) = (self.get(a), self.get(vertex), self.get(b));
        let first = (a.y - v.y).atan2(a.x - v.x);
        let second = (b.y - v.y).atan2(b.x - v.x);
        let degrees = (second - first).to_degrees().abs();
        if degrees > 180.0 { 360.0 - degrees } else { degrees }
    }
}

impl std::ops::Index<Landmark> for Pose {
    type Output = Keypoint;

    fn index(&self, landmark: Landmark) -> &Keypoint {
        self.get(landmark)
    }
}

impl TryFrom<&[Keypoint]> for Pose {
    type Error = PoseError;

    fn try_from(points: &[Keypoint]) -> Result<Self, Self::Error> {
        let keypoints: [Keypoint; LANDMARK_COUNT] = points.try_into().map_err(|_| PoseError::KeypointCount {
            expected: LANDMARK_COUNT,
            actual: points.len(),
        })?;
        Ok(Self { keypoints })
    }
}

impl TryFrom<Vec<Keypoint>> for Pose {
    type Error = PoseError;

    fn try_from(points: Vec<Keypoint>) -> Result<Self, Self::Error> {
        Self::try_from(points.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_indices_match_table() {
        for (i, landmark) in Landmark::ALL.iter().enumerate() {
            assert_eq!(landmark.index(), i);
        }
        assert_eq!(Landmark::LeftHip.index(), 23);
        assert_eq!(Landmark::RightHip.index(), 24);
        assert_eq!(Landmark::from_index(33), None);
    }

    #[test]
    fn test_wrong_count_rejected() {
        let err = Pose::try_from(vec![Keypoint::default(); 17]).unwrap_err();
        assert_eq!(
            err,
            PoseError::KeypointCount {
                expected: 33,
                actual: 17
            }
        );
    }

    #[test]
    fn test_right_angle() {
        let mut points = [Keypoint::default(); LANDMARK_COUNT];
        points[Landmark::LeftShoulder.index()] = Keypoint::new(0.5, 0.2, 0.0, 1.0);
        points[Landmark::LeftElbow.index()] = Keypoint::new(0.5, 0.5, 0.0, 1.0);
        points[Landmark::LeftWrist.index()] = Keypoint::new(0.8, 0.5, 0.0, 1.0);
        let pose = Pose::new(points);

        let angle = pose.angle(Landmark::LeftShoulder, Landmark::LeftElbow, Landmark::LeftWrist);
        assert!((angle - 90.0).abs() < 1e-9);
        assert!(pose.all_visible(&[Landmark::LeftElbow], 0.5));
        assert!(!pose.all_visible(&[Landmark::Nose], 0.5));
    }

    #[test]
    fn test_keypoint_json_defaults() {
        let point: Keypoint = serde_json::from_str(r#"{"x": 0.1, "y": 0.2}"#).unwrap();
        assert_eq!(point, Keypoint::new(0.1, 0.2, 0.0, 0.0));
    }
}
