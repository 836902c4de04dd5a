use tauri::State;

use crate::{dashboard::DashboardView, stats::StatsController, AppState};

fn controller_from_state(state: &State<'_, AppState>) -> StatsController {
    state.console.stats().clone()
}

#[tauri::command]
pub async fn get_dashboard(state: State<'_, AppState>) -> Result<DashboardView, String> {
    Ok(state.console.dashboard().snapshot())
}

#[tauri::command]
pub async fn refresh_stats(state: State<'_, AppState>) -> Result<bool, String> {
    let controller = controller_from_state(&state);
    Ok(controller.refresh_now().await)
}
