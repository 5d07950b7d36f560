use tauri::State;

use crate::capture::{CaptureController, CaptureState};
use crate::units::UnitSystem;
use crate::AppState;

fn controller_from_state(state: &State<'_, AppState>) -> CaptureController {
    state.capture.clone()
}

#[tauri::command]
pub async fn get_capture_state(state: State<'_, AppState>) -> Result<CaptureState, String> {
    let controller = controller_from_state(&state);
    Ok(controller.get_state().await)
}

#[tauri::command]
pub async fn open_instructions(state: State<'_, AppState>) -> Result<CaptureState, String> {
    let controller = controller_from_state(&state);
    controller.open_instructions().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn begin_capture(
    state: State<'_, AppState>,
    unit_system: Option<UnitSystem>,
) -> Result<CaptureState, String> {
    let controller = controller_from_state(&state);
    let unit_system = unit_system.unwrap_or_else(|| state.settings.measurement().unit_system);
    controller
        .begin_capture(unit_system)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn capture_view(state: State<'_, AppState>) -> Result<CaptureState, String> {
    let controller = controller_from_state(&state);
    controller.capture().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn save_measurements(
    state: State<'_, AppState>,
    notes: Option<String>,
) -> Result<String, String> {
    let controller = controller_from_state(&state);
    controller
        .save_measurements(notes)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn cancel_capture(state: State<'_, AppState>) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller.cancel().await.map_err(|e| e.to_string())
}
