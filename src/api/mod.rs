//! Access to the junction service.
//!
//! The rest of the crate depends on the backend traits below rather than on
//! [`JunctionApi`] directly, so controllers can run against in-process fakes.

pub mod client;
pub mod dto;
pub mod error;

use async_trait::async_trait;

use crate::models::{AreaPolygon, Junction, Point, SignalId};

pub use client::JunctionApi;
pub use dto::{LatestStatsResponse, UploadedVideo, VideoUpload};
pub use error::{ApiError, ApiResult};

/// Committed region-of-interest storage.
#[async_trait]
pub trait AreaBackend: Send + Sync {
    async fn save_area(&self, signal: SignalId, area: &[Point]) -> ApiResult<()>;

    /// `Ok(None)` when the service has no area for `signal`.
    async fn fetch_area(&self, signal: SignalId) -> ApiResult<Option<AreaPolygon>>;
}

/// Per-signal live telemetry.
#[async_trait]
pub trait StatsBackend: Send + Sync {
    async fn latest_stats(
        &self,
        junction_id: &str,
        signal: SignalId,
    ) -> ApiResult<LatestStatsResponse>;
}

/// Raw feed ingestion.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    async fn upload_videos(
        &self,
        junction_id: &str,
        uploads: Vec<VideoUpload>,
    ) -> ApiResult<Vec<UploadedVideo>>;
}

/// Junctions the operator can choose from.
#[async_trait]
pub trait DirectoryBackend: Send + Sync {
    async fn list_junctions(&self) -> ApiResult<Vec<Junction>>;
}
