//! HTTP client for the junction service endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::{
    dto::{AreaResponse, LatestStatsResponse, SaveAreaRequest, UploadedVideo, VideoUpload},
    error::{ApiError, ApiResult},
    AreaBackend, DirectoryBackend, StatsBackend, VideoBackend,
};
use crate::models::{AreaPolygon, Junction, Point, SignalId, AREA_POINTS};

#[derive(Clone)]
pub struct JunctionApi {
    client: reqwest::Client,
    base_url: String,
}

impl JunctionApi {
    /// * `base_url` - service root, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DirectoryBackend for JunctionApi {
    async fn list_junctions(&self) -> ApiResult<Vec<Junction>> {
        let response = self.client.get(self.url("/api/junctions/")).send().await?;
        read_json(response, "Failed to load junctions").await
    }
}

#[async_trait]
impl StatsBackend for JunctionApi {
    async fn latest_stats(
        &self,
        junction_id: &str,
        signal: SignalId,
    ) -> ApiResult<LatestStatsResponse> {
        let response = self
            .client
            .get(self.url("/api/latest-stats/"))
            .query(&[("junction_id", junction_id), ("signal_id", signal.as_str())])
            .send()
            .await?;

        read_json(
            response,
            &format!("Failed to fetch stats for signal {signal}"),
        )
        .await
    }
}

#[async_trait]
impl AreaBackend for JunctionApi {
    async fn save_area(&self, signal: SignalId, area: &[Point]) -> ApiResult<()> {
        if area.len() != AREA_POINTS {
            return Err(ApiError::Validation(format!(
                "an area needs exactly {AREA_POINTS} points, got {}",
                area.len()
            )));
        }

        let body = SaveAreaRequest {
            signal_id: signal,
            area: area.to_vec(),
        };

        let response = self
            .client
            .post(self.url("/api/save-area/"))
            .json(&body)
            .send()
            .await?;

        let ack: serde_json::Value = read_json(response, "Failed to save area").await?;
        debug!("area for signal {signal} saved: {ack}");
        Ok(())
    }

    async fn fetch_area(&self, signal: SignalId) -> ApiResult<Option<AreaPolygon>> {
        let response = self
            .client
            .get(self.url("/api/save-area/"))
            .query(&[("signal_id", signal.as_str())])
            .send()
            .await?;

        match read_json::<AreaResponse>(response, "Failed to load area").await {
            Ok(found) => Ok(Some(found.area)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl VideoBackend for JunctionApi {
    async fn upload_videos(
        &self,
        junction_id: &str,
        uploads: Vec<VideoUpload>,
    ) -> ApiResult<Vec<UploadedVideo>> {
        if uploads.is_empty() {
            return Err(ApiError::Validation(
                "Please select at least one video file".into(),
            ));
        }

        let mut form = Form::new();
        for upload in uploads {
            form = form
                .part("video", Part::bytes(upload.bytes).file_name(upload.file_name))
                .text("signal_id", upload.signal_id.as_str());
        }
        form = form.text("junction_id", junction_id.to_string());

        let response = self
            .client
            .post(self.url("/api/log/"))
            .multipart(form)
            .send()
            .await?;

        read_json(response, "Upload failed").await
    }
}

/// Reads the body as text, then maps it to `T` or to the matching
/// [`ApiError`].
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::from_body(status.as_u16(), &body, fallback));
    }

    serde_json::from_str(&body).map_err(|err| ApiError::Parse(err.to_string()))
}
