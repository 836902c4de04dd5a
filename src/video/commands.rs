use std::path::PathBuf;

use tauri::State;

use crate::{
    api::UploadedVideo,
    models::SignalId,
    video::{VideoController, VideoSources},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> VideoController {
    state.console.video().clone()
}

#[tauri::command]
pub async fn get_video_sources(state: State<'_, AppState>) -> Result<VideoSources, String> {
    Ok(controller_from_state(&state).sources())
}

#[tauri::command]
pub async fn configure_video_sources(
    state: State<'_, AppState>,
    sources: VideoSources,
) -> Result<(), String> {
    controller_from_state(&state).configure(sources);
    Ok(())
}

#[tauri::command]
pub async fn upload_videos(
    state: State<'_, AppState>,
    files: Vec<(SignalId, PathBuf)>,
) -> Result<Vec<UploadedVideo>, String> {
    let controller = controller_from_state(&state);
    controller
        .upload_files(files)
        .await
        .map_err(|e| e.to_string())
}
