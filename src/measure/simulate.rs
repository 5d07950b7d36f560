use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::measure::landmarks::{BodyLandmarks, Landmark};

/// Pixel jitter applied to simulated joint positions each tick.
const POSITION_JITTER_PX: f64 = 2.0;

/// Viewport-proportional base positions and fixed confidences for all 13
/// joints, ordered as in `BodyLandmarks::joints`.
const BASE_POSE: [(f64, f64, f64); 13] = [
    (0.50, 0.30, 0.95), // nose
    (0.40, 0.35, 0.88), // left shoulder
    (0.60, 0.35, 0.92), // right shoulder
    (0.35, 0.50, 0.85), // left elbow
    (0.65, 0.50, 0.87), // right elbow
    (0.30, 0.65, 0.78), // left wrist
    (0.70, 0.65, 0.82), // right wrist
    (0.45, 0.60, 0.90), // left hip
    (0.55, 0.60, 0.88), // right hip
    (0.45, 0.80, 0.85), // left knee
    (0.55, 0.80, 0.83), // right knee
    (0.45, 0.95, 0.75), // left ankle
    (0.55, 0.95, 0.78), // right ankle
];

/// Fallback landmark source when no AR capability is available: a complete
/// 13-joint pose at fixed viewport proportions with fixed confidences,
/// positions jittered slightly so consecutive ticks are not identical.
pub struct SimulatedTracker {
    viewport_width: f64,
    viewport_height: f64,
    rng: StdRng,
}

impl SimulatedTracker {
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self::with_rng(viewport_width, viewport_height, StdRng::from_entropy())
    }

    pub fn seeded(viewport_width: f64, viewport_height: f64, seed: u64) -> Self {
        Self::with_rng(viewport_width, viewport_height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(viewport_width: f64, viewport_height: f64, rng: StdRng) -> Self {
        Self {
            viewport_width,
            viewport_height,
            rng,
        }
    }

    /// Produce the pose for one tracking tick. The snapshot is replaced
    /// wholesale; callers never patch individual joints.
    pub fn next_landmarks(&mut self) -> BodyLandmarks {
        let mut joints = [Landmark::default(); 13];
        for (joint, &(fx, fy, confidence)) in joints.iter_mut().zip(BASE_POSE.iter()) {
            let jitter_x = self.rng.gen_range(-POSITION_JITTER_PX..=POSITION_JITTER_PX);
            let jitter_y = self.rng.gen_range(-POSITION_JITTER_PX..=POSITION_JITTER_PX);
            *joint = Landmark::new(
                fx * self.viewport_width + jitter_x,
                fy * self.viewport_height + jitter_y,
                0.0,
                confidence,
            );
        }

        BodyLandmarks {
            nose: joints[0],
            left_shoulder: joints[1],
            right_shoulder: joints[2],
            left_elbow: joints[3],
            right_elbow: joints[4],
            left_wrist: joints[5],
            right_wrist: joints[6],
            left_hip: joints[7],
            right_hip: joints[8],
            left_knee: joints[9],
            right_knee: joints[10],
            left_ankle: joints[11],
            right_ankle: joints[12],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_pose_has_all_joints_present() {
        let mut tracker = SimulatedTracker::seeded(390.0, 844.0, 1);
        let landmarks = tracker.next_landmarks();
        assert!(landmarks.joints().iter().all(|j| j.confidence > 0.0));
    }

    #[test]
    fn simulated_confidence_is_the_fixed_mean() {
        let mut tracker = SimulatedTracker::seeded(390.0, 844.0, 1);
        let landmarks = tracker.next_landmarks();
        let expected: f64 = BASE_POSE.iter().map(|&(_, _, c)| c).sum::<f64>() / 13.0;
        assert!((landmarks.mean_confidence() - expected).abs() < 1e-12);
        // The fixed confidences average above the 0.8 "excellent" tier.
        assert!(landmarks.mean_confidence() > 0.8);
    }

    #[test]
    fn positions_track_the_viewport() {
        let mut tracker = SimulatedTracker::seeded(1000.0, 2000.0, 7);
        let landmarks = tracker.next_landmarks();
        assert!((landmarks.nose.x - 500.0).abs() <= POSITION_JITTER_PX);
        assert!((landmarks.nose.y - 600.0).abs() <= POSITION_JITTER_PX);
        assert!((landmarks.right_ankle.y - 1900.0).abs() <= POSITION_JITTER_PX);
    }

    #[test]
    fn consecutive_ticks_vary_but_keep_confidences() {
        let mut tracker = SimulatedTracker::seeded(390.0, 844.0, 3);
        let first = tracker.next_landmarks();
        let second = tracker.next_landmarks();
        assert_ne!(first, second);
        assert_eq!(first.nose.confidence, second.nose.confidence);
    }
}
