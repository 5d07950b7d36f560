use serde::{Deserialize, Serialize};

/// Number of named joints in a full pose.
pub const JOINT_COUNT: usize = 13;

/// A named body joint position with a detection confidence in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub confidence: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, confidence: f64) -> Self {
        Self { x, y, z, confidence }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.confidence.is_finite()
    }
}

/// Fixed record of the 13 tracked joints. The vision pipeline only ever fills
/// 5 of them (nose, shoulders, hips); the rest stay zeroed with confidence 0,
/// which is how an absent joint is represented everywhere downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyLandmarks {
    pub nose: Landmark,
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_elbow: Landmark,
    pub right_elbow: Landmark,
    pub left_wrist: Landmark,
    pub right_wrist: Landmark,
    pub left_hip: Landmark,
    pub right_hip: Landmark,
    pub left_knee: Landmark,
    pub right_knee: Landmark,
    pub left_ankle: Landmark,
    pub right_ankle: Landmark,
}

impl BodyLandmarks {
    pub fn joints(&self) -> [&Landmark; JOINT_COUNT] {
        [
            &self.nose,
            &self.left_shoulder,
            &self.right_shoulder,
            &self.left_elbow,
            &self.right_elbow,
            &self.left_wrist,
            &self.right_wrist,
            &self.left_hip,
            &self.right_hip,
            &self.left_knee,
            &self.right_knee,
            &self.left_ankle,
            &self.right_ankle,
        ]
    }

    /// Arithmetic mean of all 13 joint confidences. Absent joints hold
    /// confidence 0 and drag the mean down rather than being skipped.
    pub fn mean_confidence(&self) -> f64 {
        let total: f64 = self.joints().iter().map(|j| j.confidence).sum();
        total / JOINT_COUNT as f64
    }

    pub fn all_finite(&self) -> bool {
        self.joints().iter().all(|j| j.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_landmarks_have_zero_confidence() {
        let landmarks = BodyLandmarks::default();
        assert_eq!(landmarks.mean_confidence(), 0.0);
        assert!(landmarks.all_finite());
    }

    #[test]
    fn mean_confidence_counts_absent_joints_as_zero() {
        let mut landmarks = BodyLandmarks::default();
        landmarks.nose.confidence = 1.0;
        // 1.0 / 13 joints
        let expected = 1.0 / JOINT_COUNT as f64;
        assert!((landmarks.mean_confidence() - expected).abs() < 1e-12);
    }

    #[test]
    fn non_finite_joint_is_detected() {
        let mut landmarks = BodyLandmarks::default();
        landmarks.left_hip.y = f64::NAN;
        assert!(!landmarks.all_finite());
    }
}
