pub mod config;
pub mod contours;
pub mod edges;
pub mod scoring;

use log::warn;

use crate::camera::Frame;
use crate::measure::landmarks::BodyLandmarks;

pub use config::VisionConfig;
pub use scoring::{StubVerticalDetector, VerticalStructureDetector};

/// Outcome of analyzing one frame for a human presence.
#[derive(Debug, Clone, Default)]
pub struct BodyAnalysis {
    pub has_human: bool,
    pub confidence: f64,
    /// Partial pose: only nose, shoulders and hips are ever filled.
    pub landmarks: BodyLandmarks,
}

impl BodyAnalysis {
    /// The degraded answer for a failed or empty analysis.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Frame analysis pipeline: grayscale, Sobel edge map, contour extraction,
/// human-shape scoring, keypoint synthesis. Stateless across frames.
pub struct VisionAnalyzer {
    config: VisionConfig,
    vertical: Box<dyn VerticalStructureDetector>,
}

impl VisionAnalyzer {
    pub fn new() -> Self {
        Self::with_config(VisionConfig::default())
    }

    pub fn with_config(config: VisionConfig) -> Self {
        Self {
            config,
            vertical: Box::new(StubVerticalDetector),
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn VerticalStructureDetector>) -> Self {
        self.vertical = detector;
        self
    }

    /// Analyze one frame. Never fails: any stage error degrades to
    /// `{has_human: false, confidence: 0}` and tracking continues on the
    /// next tick.
    pub fn analyze(&self, frame: &Frame) -> BodyAnalysis {
        match self.try_analyze(frame) {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!("frame analysis failed, reporting no body: {err:#}");
                BodyAnalysis::none()
            }
        }
    }

    fn try_analyze(&self, frame: &Frame) -> anyhow::Result<BodyAnalysis> {
        let width = frame.width as usize;
        let height = frame.height as usize;

        let grayscale = edges::to_grayscale(&frame.pixels)?;
        let edge_map = edges::sobel_magnitudes(&grayscale, width, height)?;
        let contours = contours::find_contours(
            &edge_map,
            width,
            height,
            self.config.edge_threshold,
            self.config.min_contour_points,
        )?;

        let score = scoring::human_shape_score(
            &contours,
            frame.width,
            frame.height,
            self.vertical.as_ref(),
            &self.config,
        );

        let has_human = score > self.config.detection_threshold;
        let landmarks = if has_human {
            scoring::synthesize_keypoints(frame.width, frame.height)
        } else {
            BodyLandmarks::default()
        };

        Ok(BodyAnalysis {
            has_human,
            confidence: score,
            landmarks,
        })
    }
}

impl Default for VisionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FrameSource, StubCamera};
    use crate::vision::contours::Contour;

    #[test]
    fn solid_black_frame_has_no_human() {
        let frame = StubCamera::default().capture_frame().unwrap();
        let analysis = VisionAnalyzer::new().analyze(&frame);
        assert!(!analysis.has_human);
        assert_eq!(analysis.confidence, 0.0);
        assert_eq!(analysis.landmarks, BodyLandmarks::default());
    }

    #[test]
    fn corrupt_frame_degrades_instead_of_failing() {
        let mut frame = StubCamera::new(16, 16).capture_frame().unwrap();
        frame.pixels.truncate(7);
        let analysis = VisionAnalyzer::new().analyze(&frame);
        assert!(!analysis.has_human);
        assert_eq!(analysis.confidence, 0.0);
    }

    struct AlwaysVertical;

    impl VerticalStructureDetector for AlwaysVertical {
        fn strength(&self, _: &Contour, _: u32, _: u32) -> f64 {
            1.0
        }
    }

    /// Paint two tall bright rectangles on black: each produces an outline
    /// contour that is human-proportioned and large, so with a cooperative
    /// vertical detector the score crosses the detection threshold.
    fn frame_with_two_figures() -> Frame {
        let width = 400u32;
        let height = 400u32;
        let mut pixels = vec![0u8; (width * height * 3) as usize];
        for &x0 in &[20u32, 220u32] {
            for y in 40..360u32 {
                for x in x0..x0 + 160 {
                    let idx = ((y * width + x) * 3) as usize;
                    pixels[idx] = 255;
                    pixels[idx + 1] = 255;
                    pixels[idx + 2] = 255;
                }
            }
        }
        Frame::new(width, height, pixels).unwrap()
    }

    #[test]
    fn figure_frame_crosses_detection_threshold() {
        let frame = frame_with_two_figures();
        let analyzer = VisionAnalyzer::new().with_detector(Box::new(AlwaysVertical));
        let analysis = analyzer.analyze(&frame);
        assert!(analysis.has_human);
        assert!(analysis.confidence > 0.6);
        // Keypoints are synthesized around frame center.
        assert_eq!(analysis.landmarks.nose.x, 200.0);
        assert_eq!(analysis.landmarks.nose.confidence, 0.8);
        assert_eq!(analysis.landmarks.left_wrist.confidence, 0.0);
    }

    #[test]
    fn stub_detector_alone_never_detects_on_plain_rectangles() {
        let frame = frame_with_two_figures();
        let analysis = VisionAnalyzer::new().analyze(&frame);
        // Outline contours qualify for the proportion bonus at most, which
        // cannot exceed the 0.6 gate on its own with two contours.
        assert!(analysis.confidence <= 0.6);
        assert!(!analysis.has_human);
    }
}
