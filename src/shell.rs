use log::warn;
use tauri::{Emitter, Manager, State};

use crate::{
    areas::commands::{
        add_area_point, cancel_area_selection, commit_area, get_capture_phase, get_capture_state,
        load_areas, reset_area, start_area_selection,
    },
    config::ConsoleConfig,
    console::Console,
    models::Junction,
    stats::commands::{get_dashboard, refresh_stats},
    utils::logging,
    video::commands::{configure_video_sources, get_video_sources, upload_videos},
};

pub(crate) struct AppState {
    pub(crate) console: Console,
}

#[tauri::command]
async fn list_junctions(state: State<'_, AppState>) -> Result<Vec<Junction>, String> {
    state
        .console
        .list_junctions()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn select_junction(state: State<'_, AppState>, junction_id: String) -> Result<usize, String> {
    state
        .console
        .select_junction(junction_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn clear_junction(state: State<'_, AppState>) -> Result<(), String> {
    state
        .console
        .clear_junction()
        .await
        .map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    logging::init();

    log::info!("Junction console starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;

                let config = ConsoleConfig::from_env(app_data_dir);
                let console = Console::new(&config)?;

                // Push every dashboard change to the webview.
                let mut updates = console.dashboard().subscribe();
                let app_handle = app.handle().clone();
                tauri::async_runtime::spawn(async move {
                    while updates.changed().await.is_ok() {
                        let view = updates.borrow_and_update().clone();
                        if let Err(err) = app_handle.emit("dashboard-updated", &view) {
                            warn!("Failed to emit dashboard update: {err}");
                        }
                    }
                });

                app.manage(AppState { console });
                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            list_junctions,
            select_junction,
            clear_junction,
            get_dashboard,
            refresh_stats,
            get_capture_state,
            get_capture_phase,
            start_area_selection,
            add_area_point,
            reset_area,
            commit_area,
            cancel_area_selection,
            load_areas,
            get_video_sources,
            configure_video_sources,
            upload_videos,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
