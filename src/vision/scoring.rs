use crate::measure::landmarks::{BodyLandmarks, Landmark};
use crate::vision::config::VisionConfig;
use crate::vision::contours::Contour;

/// Strength reported when the line detector finds vertical runs, and when it
/// does not. The detector itself is a placeholder (see `StubVerticalDetector`)
/// so in practice only the low constant is ever produced.
const VERTICAL_STRENGTH_HIGH: f64 = 0.8;
const VERTICAL_STRENGTH_LOW: f64 = 0.2;

/// Torso-structure heuristic, isolated behind a trait so a real pose model
/// can replace the stub without touching the orchestrator.
pub trait VerticalStructureDetector: Send + Sync {
    fn strength(&self, contour: &Contour, frame_width: u32, frame_height: u32) -> f64;
}

/// Placeholder detector: vertical line extraction is unimplemented and
/// returns no lines, so the reported strength is always the low constant.
pub struct StubVerticalDetector;

impl StubVerticalDetector {
    fn detect_vertical_lines(
        &self,
        _contour: &Contour,
        _frame_width: u32,
        _frame_height: u32,
    ) -> Vec<(u32, u32)> {
        Vec::new()
    }
}

impl VerticalStructureDetector for StubVerticalDetector {
    fn strength(&self, contour: &Contour, frame_width: u32, frame_height: u32) -> f64 {
        if self
            .detect_vertical_lines(contour, frame_width, frame_height)
            .is_empty()
        {
            VERTICAL_STRENGTH_LOW
        } else {
            VERTICAL_STRENGTH_HIGH
        }
    }
}

/// Additively score the contour set for human-likeness, clamped to [0, 1].
/// A contour contributes the proportion bonus when its bounding box sits in
/// the human aspect band and it is large enough to be a body, and the
/// vertical bonus when the structure detector reports enough strength.
pub fn human_shape_score(
    contours: &[Contour],
    frame_width: u32,
    frame_height: u32,
    detector: &dyn VerticalStructureDetector,
    config: &VisionConfig,
) -> f64 {
    let mut score = 0.0;

    for contour in contours {
        let Some(bounds) = contour.bounds() else {
            continue;
        };
        let aspect_ratio = bounds.aspect_ratio();

        if aspect_ratio > config.aspect_ratio_min
            && aspect_ratio < config.aspect_ratio_max
            && contour.len() > config.min_body_contour_points
        {
            score += config.proportion_score;
        }

        if detector.strength(contour, frame_width, frame_height) > config.vertical_strength_threshold
        {
            score += config.vertical_score;
        }
    }

    score.clamp(0.0, 1.0)
}

/// Synthesize the 5 joints the pipeline can currently place, positioned at
/// fixed offsets from frame center with fixed confidences. This is a
/// heuristic placeholder, not a pose estimator; the other 8 joints stay
/// absent (zeroed).
pub fn synthesize_keypoints(frame_width: u32, frame_height: u32) -> BodyLandmarks {
    let cx = frame_width as f64 / 2.0;
    let cy = frame_height as f64 / 2.0;

    BodyLandmarks {
        nose: Landmark::new(cx, cy - 100.0, 0.0, 0.8),
        left_shoulder: Landmark::new(cx - 50.0, cy - 50.0, 0.0, 0.7),
        right_shoulder: Landmark::new(cx + 50.0, cy - 50.0, 0.0, 0.7),
        left_hip: Landmark::new(cx - 40.0, cy + 50.0, 0.0, 0.6),
        right_hip: Landmark::new(cx + 40.0, cy + 50.0, 0.0, 0.6),
        ..BodyLandmarks::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(f64);

    impl VerticalStructureDetector for FixedDetector {
        fn strength(&self, _: &Contour, _: u32, _: u32) -> f64 {
            self.0
        }
    }

    fn tall_contour(points: usize) -> Contour {
        // Vertical strip 100 wide, 200 tall: aspect ratio 2.0.
        let mut contour = Contour {
            points: vec![(0, 0), (100, 200)],
        };
        for i in 0..points.saturating_sub(2) {
            contour.points.push((50, (i % 200) as u32));
        }
        contour
    }

    #[test]
    fn stub_detector_reports_low_strength() {
        let detector = StubVerticalDetector;
        let contour = tall_contour(10);
        assert_eq!(detector.strength(&contour, 640, 480), 0.2);
    }

    #[test]
    fn no_contours_scores_zero() {
        let config = VisionConfig::default();
        let score = human_shape_score(&[], 640, 480, &StubVerticalDetector, &config);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn body_sized_contour_earns_proportion_bonus() {
        let config = VisionConfig::default();
        let contours = vec![tall_contour(1500)];
        let score = human_shape_score(&contours, 640, 480, &StubVerticalDetector, &config);
        assert!((score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn small_contour_earns_nothing_with_stub_detector() {
        let config = VisionConfig::default();
        let contours = vec![tall_contour(500)];
        let score = human_shape_score(&contours, 640, 480, &StubVerticalDetector, &config);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn vertical_bonus_applies_above_threshold() {
        let config = VisionConfig::default();
        let contours = vec![tall_contour(500)];
        let score = human_shape_score(&contours, 640, 480, &FixedDetector(0.8), &config);
        assert!((score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn score_is_clamped_to_one() {
        let config = VisionConfig::default();
        let contours: Vec<Contour> = (0..5).map(|_| tall_contour(1500)).collect();
        let score = human_shape_score(&contours, 640, 480, &FixedDetector(0.8), &config);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn synthesized_keypoints_are_partial() {
        let landmarks = synthesize_keypoints(1920, 1080);
        assert_eq!(landmarks.nose.confidence, 0.8);
        assert_eq!(landmarks.left_shoulder.confidence, 0.7);
        assert_eq!(landmarks.right_shoulder.confidence, 0.7);
        assert_eq!(landmarks.left_hip.confidence, 0.6);
        assert_eq!(landmarks.right_hip.confidence, 0.6);
        // The 8 remaining joints stay absent.
        assert_eq!(landmarks.left_wrist.confidence, 0.0);
        assert_eq!(landmarks.right_ankle, Landmark::default());
        assert_eq!(landmarks.nose.x, 960.0);
        assert_eq!(landmarks.nose.y, 440.0);
    }
}
