/// Tunable thresholds for the frame analysis stages. The numeric values are
/// empirical and carried over as-is from the original calibration.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Edge magnitude above which a pixel seeds or joins a contour.
    pub edge_threshold: u8,

    /// Contours at or below this point count are discarded as noise.
    pub min_contour_points: usize,

    /// Point count a contour must exceed to count as a body-sized region.
    pub min_body_contour_points: usize,

    /// Bounding-box height/width band considered human-proportioned.
    pub aspect_ratio_min: f64,
    pub aspect_ratio_max: f64,

    /// Score contributions per qualifying contour.
    pub proportion_score: f64,
    pub vertical_score: f64,

    /// Vertical-structure strength above which the bonus applies.
    pub vertical_strength_threshold: f64,

    /// Accumulated score above which a human is declared present.
    pub detection_threshold: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 50,
            min_contour_points: 100,
            min_body_contour_points: 1000,
            aspect_ratio_min: 1.5,
            aspect_ratio_max: 3.0,
            proportion_score: 0.3,
            vertical_score: 0.2,
            vertical_strength_threshold: 0.5,
            detection_threshold: 0.6,
        }
    }
}
