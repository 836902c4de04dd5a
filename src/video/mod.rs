#[cfg(feature = "desktop")]
pub mod commands;
mod sources;

pub use sources::VideoSources;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};

use crate::{
    api::{ApiError, UploadedVideo, VideoBackend, VideoUpload},
    dashboard::Dashboard,
    models::SignalId,
};

/// Per-signal feed configuration and raw video ingestion.
#[derive(Clone)]
pub struct VideoController {
    backend: Arc<dyn VideoBackend>,
    dashboard: Dashboard,
}

impl VideoController {
    pub fn new(backend: Arc<dyn VideoBackend>, dashboard: Dashboard) -> Self {
        Self { backend, dashboard }
    }

    pub fn sources(&self) -> VideoSources {
        self.dashboard.read(|view| view.video_sources.clone())
    }

    /// Replaces every configured source.
    pub fn configure(&self, sources: VideoSources) {
        self.dashboard.update(|view| view.video_sources = sources);
        self.dashboard.info("Video sources configured successfully");
    }

    /// Sends raw videos for the selected junction. Returned processed URLs
    /// replace the matching sources.
    pub async fn upload(&self, uploads: Vec<VideoUpload>) -> Result<Vec<UploadedVideo>, ApiError> {
        let junction_id = self
            .dashboard
            .junction_id()
            .ok_or_else(|| ApiError::Validation("Please select a junction first".into()))?;

        let count = uploads.len();
        self.dashboard
            .info(format!("Uploading {count} video file(s) for junction {junction_id}"));

        let uploaded = match self.backend.upload_videos(&junction_id, uploads).await {
            Ok(uploaded) => uploaded,
            Err(err) => {
                self.dashboard.error(format!("Upload failed: {err}"));
                return Err(err);
            }
        };

        let mut changed = Vec::new();
        self.dashboard
            .update(|view| changed = view.video_sources.apply_uploaded(&uploaded));
        for item in &uploaded {
            if let Some(count) = item.vehicle_count {
                self.dashboard.info(format!(
                    "Signal {}: {count} vehicles detected",
                    item.signal_id
                ));
            }
        }
        self.dashboard.info(format!(
            "Upload complete ({} of {count} sources updated)",
            changed.len()
        ));
        Ok(uploaded)
    }

    /// Reads each file from disk and uploads them together.
    pub async fn upload_files(
        &self,
        files: Vec<(SignalId, PathBuf)>,
    ) -> Result<Vec<UploadedVideo>> {
        let mut uploads = Vec::with_capacity(files.len());
        for (signal_id, path) in files {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .ok_or_else(|| anyhow!("not a file path: {}", path.display()))?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read video {}", path.display()))?;
            uploads.push(VideoUpload {
                signal_id,
                file_name,
                bytes,
            });
        }

        Ok(self.upload(uploads).await?)
    }
}
