use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::measure::converter::MeasurementResult;
use crate::measure::landmarks::BodyLandmarks;
use crate::units::UnitSystem;

pub const MEASUREMENT_TYPE_AR: &str = "ar";

/// Depth of the torso estimated from the side-view chest circumference.
const DEPTH_FROM_CHEST: f64 = 0.3;

/// Measurements captured from the front view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMeasurement {
    pub height: f64,
    pub shoulder_width: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub confidence: f64,
    pub captured_at: DateTime<Utc>,
}

impl FrontMeasurement {
    pub fn from_result(result: &MeasurementResult, captured_at: DateTime<Utc>) -> Self {
        Self {
            height: result.height,
            shoulder_width: result.shoulder_width,
            chest: result.chest,
            waist: result.waist,
            hips: result.hips,
            confidence: result.confidence,
            captured_at,
        }
    }
}

/// The side view only contributes torso depth plus its own confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideMeasurement {
    pub depth: f64,
    pub confidence: f64,
    pub captured_at: DateTime<Utc>,
}

impl SideMeasurement {
    pub fn from_result(result: &MeasurementResult, captured_at: DateTime<Utc>) -> Self {
        Self {
            depth: result.chest * DEPTH_FROM_CHEST,
            confidence: result.confidence,
            captured_at,
        }
    }
}

/// Flat measurement map of a completed two-view session: the five front-view
/// values plus the side-view depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedMeasurements {
    pub height: f64,
    pub shoulder_width: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub depth: f64,
}

/// A completed session record, the shape handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRecord {
    pub measurement_type: String,
    pub measurements: MergedMeasurements,
    pub unit_system: UnitSystem,
    pub body_landmarks: BodyLandmarks,
    /// Side-view conversion confidence, the record's reliability signal.
    pub ar_confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl MergedRecord {
    /// Merge a front and side capture. Validation happens here, at the only
    /// point where a loosely accumulated session becomes a durable record.
    pub fn merge(
        front: &FrontMeasurement,
        side: &SideMeasurement,
        unit_system: UnitSystem,
        body_landmarks: BodyLandmarks,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let measurements = MergedMeasurements {
            height: front.height,
            shoulder_width: front.shoulder_width,
            chest: front.chest,
            waist: front.waist,
            hips: front.hips,
            depth: side.depth,
        };

        for (name, value) in [
            ("height", measurements.height),
            ("shoulderWidth", measurements.shoulder_width),
            ("chest", measurements.chest),
            ("waist", measurements.waist),
            ("hips", measurements.hips),
            ("depth", measurements.depth),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("merged measurement '{name}' is invalid: {value}");
            }
        }
        if !(0.0..=1.0).contains(&side.confidence) {
            bail!("side-view confidence {} outside [0, 1]", side.confidence);
        }

        Ok(Self {
            measurement_type: MEASUREMENT_TYPE_AR.to_string(),
            measurements,
            unit_system,
            body_landmarks,
            ar_confidence: side.confidence,
            created_at,
        })
    }
}
