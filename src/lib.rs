mod ar;
mod camera;
mod capture;
mod db;
mod history;
mod measure;
mod settings;
mod sizing;
mod units;
mod vision;

use std::sync::Arc;

use camera::StubCamera;
use capture::{
    commands::{
        begin_capture, cancel_capture, capture_view, get_capture_state, open_instructions,
        save_measurements,
    },
    CaptureController,
};
use db::Database;
use history::{delete_measurement, get_measurement, list_measurements, update_measurement_notes};
use settings::{MeasurementSettings, SettingsStore};
use sizing::{get_size_recommendation, list_size_charts};
use tauri::{Emitter, Manager, State};
use units::{convert_measurement, ConvertedValue, UnitSystem};

pub(crate) struct AppState {
    pub(crate) capture: CaptureController,
    pub(crate) db: Database,
    pub(crate) settings: SettingsStore,
}

#[tauri::command]
fn get_measurement_settings(state: State<AppState>) -> Result<MeasurementSettings, String> {
    Ok(state.settings.measurement())
}

#[tauri::command]
fn set_measurement_settings(
    settings: MeasurementSettings,
    state: State<AppState>,
    app_handle: tauri::AppHandle,
) -> Result<(), String> {
    state
        .settings
        .update_measurement(settings.clone())
        .map_err(|e| e.to_string())?;

    app_handle
        .emit("measurement-settings-updated", &settings)
        .map_err(|e| e.to_string())?;

    Ok(())
}

#[tauri::command]
fn convert_measurement_value(
    value: f64,
    from: UnitSystem,
    to: UnitSystem,
) -> Result<ConvertedValue, String> {
    Ok(convert_measurement(value, from, to))
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("FitForm starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let db_path = app_data_dir.join("fitform.sqlite3");
                let database = Database::new(db_path)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings_store = SettingsStore::new(settings_path)?;

                let capture_controller = CaptureController::new(
                    app.handle().clone(),
                    database.clone(),
                    ar::platform_capability(),
                    Arc::new(StubCamera::default()),
                );

                app.manage(AppState {
                    capture: capture_controller,
                    db: database,
                    settings: settings_store,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_capture_state,
            open_instructions,
            begin_capture,
            capture_view,
            save_measurements,
            cancel_capture,
            list_measurements,
            get_measurement,
            update_measurement_notes,
            delete_measurement,
            list_size_charts,
            get_size_recommendation,
            get_measurement_settings,
            set_measurement_settings,
            convert_measurement_value,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
