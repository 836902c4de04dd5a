use tauri::State;

use crate::{
    areas::{CaptureController, CapturePhase, CaptureProgress, CaptureView},
    models::Point,
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> CaptureController {
    state.console.capture().clone()
}

#[tauri::command]
pub async fn get_capture_state(state: State<'_, AppState>) -> Result<Option<CaptureView>, String> {
    let controller = controller_from_state(&state);
    Ok(controller.view().await)
}

#[tauri::command]
pub async fn get_capture_phase(state: State<'_, AppState>) -> Result<CapturePhase, String> {
    let controller = controller_from_state(&state);
    Ok(controller.phase().await)
}

#[tauri::command]
pub async fn start_area_selection(state: State<'_, AppState>) -> Result<CaptureView, String> {
    let controller = controller_from_state(&state);
    controller.start().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn add_area_point(
    state: State<'_, AppState>,
    x: u32,
    y: u32,
) -> Result<CaptureView, String> {
    let controller = controller_from_state(&state);
    controller
        .add_point(Point::new(x, y))
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn reset_area(state: State<'_, AppState>) -> Result<CaptureView, String> {
    let controller = controller_from_state(&state);
    controller.reset().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn commit_area(state: State<'_, AppState>) -> Result<CaptureProgress, String> {
    let controller = controller_from_state(&state);
    controller.commit().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn cancel_area_selection(state: State<'_, AppState>) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller.cancel().await;
    Ok(())
}

#[tauri::command]
pub async fn load_areas(state: State<'_, AppState>) -> Result<usize, String> {
    let controller = controller_from_state(&state);
    Ok(controller.load_areas().await)
}
