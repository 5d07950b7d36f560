use chrono::Utc;
use tauri::State;

use crate::db::MeasurementEntry;
use crate::units::UnitSystem;
use crate::AppState;

#[tauri::command]
pub async fn list_measurements(
    state: State<'_, AppState>,
    unit_system: Option<String>,
    measurement_type: Option<String>,
) -> Result<Vec<MeasurementEntry>, String> {
    let unit_system = match unit_system.as_deref() {
        Some(value) => Some(
            UnitSystem::parse(value).ok_or_else(|| format!("unknown unit system '{value}'"))?,
        ),
        None => None,
    };

    state
        .db
        .list_measurements(unit_system, measurement_type)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_measurement(
    state: State<'_, AppState>,
    measurement_id: String,
) -> Result<Option<MeasurementEntry>, String> {
    state
        .db
        .get_measurement(&measurement_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn update_measurement_notes(
    state: State<'_, AppState>,
    measurement_id: String,
    notes: Option<String>,
) -> Result<bool, String> {
    state
        .db
        .update_measurement_notes(&measurement_id, notes, Utc::now())
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_measurement(
    state: State<'_, AppState>,
    measurement_id: String,
) -> Result<bool, String> {
    state
        .db
        .delete_measurement(&measurement_id)
        .await
        .map_err(|e| e.to_string())
}
