use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::measure::landmarks::BodyLandmarks;

/// Fallback pixel-to-cm scale when calibration from shoulder width fails.
const DEFAULT_PX_TO_CM: f64 = 0.0264;
/// Average shoulder width as a fraction of standing height.
const SHOULDER_TO_HEIGHT_RATIO: f64 = 0.23;
const MIN_HEIGHT_CM: f64 = 150.0;
const MAX_HEIGHT_CM: f64 = 220.0;
const DEFAULT_HEIGHT_CM: f64 = 170.0;
/// Chest circumference relative to shoulder width.
const CHEST_FROM_SHOULDER: f64 = 2.2;
const NECK_FROM_SHOULDER: f64 = 0.4;
/// Base confidence of the calibration itself, before landmark quality.
const CALIBRATION_CONFIDENCE: f64 = 0.8;
/// Plausible shoulder width in pixels; outside this band confidence halves.
const PLAUSIBLE_SHOULDER_PX: std::ops::RangeInclusive<f64> = 50.0..=200.0;
const IMPLAUSIBLE_PENALTY: f64 = 0.5;

/// Capture angle. Side view applies slightly different circumference ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Front,
    Side,
}

impl View {
    fn chest_multiplier(self) -> f64 {
        match self {
            View::Front => 1.0,
            View::Side => 0.95,
        }
    }

    fn waist_ratio(self) -> f64 {
        match self {
            View::Front => 0.85,
            View::Side => 0.90,
        }
    }

    fn hip_ratio(self) -> f64 {
        match self {
            View::Front => 0.95,
            View::Side => 1.0,
        }
    }
}

/// Real-world measurements derived from one landmark snapshot. Circumference
/// and width values are whole centimeters; height keeps its clamped value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementResult {
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub neck: f64,
    pub shoulder_width: f64,
    pub height: f64,
    pub confidence: f64,
    pub timestamp_millis: i64,
}

impl MeasurementResult {
    /// The degraded answer when conversion fails: all zeros, confidence 0.
    fn zeroed(timestamp_millis: i64) -> Self {
        Self {
            chest: 0.0,
            waist: 0.0,
            hips: 0.0,
            neck: 0.0,
            shoulder_width: 0.0,
            height: 0.0,
            confidence: 0.0,
            timestamp_millis,
        }
    }
}

/// Pixel-space distances between landmark pairs, the inputs to calibration.
struct PixelDistances {
    shoulder_width: f64,
    #[allow(dead_code)]
    chest_width: f64,
    #[allow(dead_code)]
    waist_width: f64,
    #[allow(dead_code)]
    hip_width: f64,
}

fn pixel_distances(landmarks: &BodyLandmarks) -> PixelDistances {
    let shoulder_width = (landmarks.right_shoulder.x - landmarks.left_shoulder.x).abs();
    let hip_width = (landmarks.right_hip.x - landmarks.left_hip.x).abs();
    PixelDistances {
        shoulder_width,
        chest_width: shoulder_width * 1.1,
        waist_width: hip_width * 0.9,
        hip_width,
    }
}

/// Standing height from nose to the lower ankle, converted with the default
/// scale and clamped to a plausible adult range. Bad input defaults to 170.
fn height_from_landmarks(landmarks: &BodyLandmarks) -> f64 {
    let feet_y = landmarks.left_ankle.y.max(landmarks.right_ankle.y);
    let height_px = feet_y - landmarks.nose.y;
    let height_cm = height_px * DEFAULT_PX_TO_CM;
    if !height_cm.is_finite() {
        return DEFAULT_HEIGHT_CM;
    }
    height_cm.clamp(MIN_HEIGHT_CM, MAX_HEIGHT_CM)
}

/// Scale factor calibrated from the estimated height: shoulder width is
/// assumed to be 23% of height. A degenerate shoulder span falls back to the
/// default scale.
fn pixel_to_cm_ratio(shoulder_width_px: f64, height_cm: f64) -> f64 {
    let ratio = (height_cm * SHOULDER_TO_HEIGHT_RATIO) / shoulder_width_px;
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        DEFAULT_PX_TO_CM
    }
}

fn measurement_confidence(landmarks: &BodyLandmarks, shoulder_width_px: f64) -> f64 {
    let mut confidence = CALIBRATION_CONFIDENCE * landmarks.mean_confidence();
    if !PLAUSIBLE_SHOULDER_PX.contains(&shoulder_width_px) {
        confidence *= IMPLAUSIBLE_PENALTY;
    }
    confidence.clamp(0.0, 1.0)
}

/// Convert a landmark snapshot into real-world measurements for one view,
/// timestamped now. See [`convert_at`] for the deterministic core.
pub fn convert(landmarks: &BodyLandmarks, view: View) -> MeasurementResult {
    convert_at(landmarks, view, Utc::now().timestamp_millis())
}

/// Deterministic conversion: identical landmarks, view and timestamp yield
/// bit-identical results. Any failure (non-finite coordinates) yields the
/// zeroed result instead of an error.
pub fn convert_at(
    landmarks: &BodyLandmarks,
    view: View,
    timestamp_millis: i64,
) -> MeasurementResult {
    if !landmarks.all_finite() {
        return MeasurementResult::zeroed(timestamp_millis);
    }

    let distances = pixel_distances(landmarks);
    let height_cm = height_from_landmarks(landmarks);
    let ratio = pixel_to_cm_ratio(distances.shoulder_width, height_cm);

    let chest = distances.shoulder_width * ratio * CHEST_FROM_SHOULDER * view.chest_multiplier();
    let waist = chest * view.waist_ratio();
    let hips = chest * view.hip_ratio();
    let neck = distances.shoulder_width * ratio * NECK_FROM_SHOULDER;
    let shoulder_width = distances.shoulder_width * ratio;

    MeasurementResult {
        chest: chest.round(),
        waist: waist.round(),
        hips: hips.round(),
        neck: neck.round(),
        shoulder_width: shoulder_width.round(),
        height: height_cm,
        confidence: measurement_confidence(landmarks, distances.shoulder_width),
        timestamp_millis,
    }
}
