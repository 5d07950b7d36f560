use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tauri::State;

use crate::AppState;

const CM_PER_INCH: f64 = 2.54;

/// Minimum confidence reported for any recommendation.
const CONFIDENCE_FLOOR: f64 = 0.1;

/// A garment size chart: per-size reference measurements in inches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeChart {
    pub category: String,
    pub gender: String,
    pub sizes: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRecommendation {
    pub recommended_size: String,
    pub confidence_score: f64,
}

fn size_entry(values: [(&str, f64); 3]) -> BTreeMap<String, f64> {
    values
        .iter()
        .map(|&(k, v)| (k.to_string(), v))
        .collect()
}

/// Built-in charts used until a tailor provides custom ones.
pub fn default_charts() -> Vec<SizeChart> {
    let mut sizes = BTreeMap::new();
    sizes.insert("XS".into(), size_entry([("chest", 35.0), ("waist", 29.0), ("hips", 35.0)]));
    sizes.insert("S".into(), size_entry([("chest", 37.0), ("waist", 31.0), ("hips", 37.0)]));
    sizes.insert("M".into(), size_entry([("chest", 39.0), ("waist", 33.0), ("hips", 39.0)]));
    sizes.insert("L".into(), size_entry([("chest", 41.0), ("waist", 35.0), ("hips", 41.0)]));
    sizes.insert("XL".into(), size_entry([("chest", 43.0), ("waist", 37.0), ("hips", 43.0)]));
    sizes.insert("XXL".into(), size_entry([("chest", 46.0), ("waist", 40.0), ("hips", 46.0)]));

    vec![SizeChart {
        category: "tops".into(),
        gender: "unisex".into(),
        sizes,
    }]
}

/// Bucket a chest measurement (inches) into a letter size.
fn size_for_chest(chest_inches: f64) -> &'static str {
    if chest_inches <= 36.0 {
        "XS"
    } else if chest_inches <= 38.0 {
        "S"
    } else if chest_inches <= 40.0 {
        "M"
    } else if chest_inches <= 42.0 {
        "L"
    } else if chest_inches <= 44.0 {
        "XL"
    } else {
        "XXL"
    }
}

/// Recommend a size from body measurements given in inches. Confidence drops
/// with the average distance between the provided measurements and the
/// chart's reference values for the chosen size, floored at 0.1.
pub fn recommend(
    measurements: &BTreeMap<String, f64>,
    chart: &SizeChart,
) -> Result<SizeRecommendation> {
    let chest = measurements
        .get("chest")
        .copied()
        .ok_or_else(|| anyhow!("a chest measurement is required for sizing"))?;
    if !chest.is_finite() || chest <= 0.0 {
        return Err(anyhow!("chest measurement {chest} is not usable"));
    }

    let recommended = size_for_chest(chest);
    let reference = chart
        .sizes
        .get(recommended)
        .ok_or_else(|| anyhow!("chart '{}' has no size '{recommended}'", chart.category))?;

    let mut total_variance = 0.0;
    for (key, value) in measurements {
        if let Some(expected) = reference.get(key) {
            total_variance += (value - expected).abs();
        }
    }
    let average_variance = total_variance / measurements.len() as f64;
    let confidence = (1.0 - average_variance / 10.0).max(CONFIDENCE_FLOOR);

    Ok(SizeRecommendation {
        recommended_size: recommended.to_string(),
        confidence_score: (confidence * 100.0).round() / 100.0,
    })
}

/// Same as [`recommend`] for measurements stored in centimeters.
pub fn recommend_from_cm(
    measurements_cm: &BTreeMap<String, f64>,
    chart: &SizeChart,
) -> Result<SizeRecommendation> {
    let in_inches = measurements_cm
        .iter()
        .map(|(k, v)| (k.clone(), v / CM_PER_INCH))
        .collect();
    recommend(&in_inches, chart)
}

#[tauri::command]
pub fn list_size_charts() -> Result<Vec<SizeChart>, String> {
    Ok(default_charts())
}

#[tauri::command]
pub async fn get_size_recommendation(
    state: State<'_, AppState>,
    measurement_id: String,
) -> Result<SizeRecommendation, String> {
    let entry = state
        .db
        .get_measurement(&measurement_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("measurement '{measurement_id}' not found"))?;

    let mut measurements = BTreeMap::new();
    measurements.insert("chest".to_string(), entry.measurements.chest);
    measurements.insert("waist".to_string(), entry.measurements.waist);
    measurements.insert("hips".to_string(), entry.measurements.hips);

    let charts = default_charts();
    let chart = charts
        .first()
        .ok_or_else(|| "no size charts configured".to_string())?;

    recommend_from_cm(&measurements, chart).map_err(|e| e.to_string())
}
