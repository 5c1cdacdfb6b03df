use tauri::State;

use crate::{
    control::TimerUpdate,
    service::ServiceHandle,
    settings::{Configuration, ConfigurationPatch},
};

use crate::AppState;

fn service_from_state(state: &State<'_, AppState>) -> ServiceHandle {
    state.service.clone()
}

#[tauri::command]
pub async fn get_timer_state(state: State<'_, AppState>) -> Result<TimerUpdate, String> {
    let service = service_from_state(&state);
    service.snapshot().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_settings(state: State<'_, AppState>) -> Result<Configuration, String> {
    let service = service_from_state(&state);
    service.settings().await.map_err(|e| e.to_string())
}

/// Returns `false` when the update was rejected or could not be written.
#[tauri::command]
pub async fn save_settings(
    state: State<'_, AppState>,
    settings: ConfigurationPatch,
) -> Result<bool, String> {
    let service = service_from_state(&state);
    service
        .save_settings(settings)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn toggle_timer(state: State<'_, AppState>) -> Result<TimerUpdate, String> {
    let service = service_from_state(&state);
    service.toggle_timer().map_err(|e| e.to_string())?;
    service.snapshot().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn set_timer_running(
    state: State<'_, AppState>,
    running: bool,
) -> Result<TimerUpdate, String> {
    let service = service_from_state(&state);
    service.set_running(running).map_err(|e| e.to_string())?;
    service.snapshot().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn reset_timers(state: State<'_, AppState>) -> Result<TimerUpdate, String> {
    let service = service_from_state(&state);
    service.reset_timers().map_err(|e| e.to_string())?;
    service.snapshot().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn close_overlay(state: State<'_, AppState>) -> Result<(), String> {
    let service = service_from_state(&state);
    service.close_overlay().map_err(|e| e.to_string())
}
