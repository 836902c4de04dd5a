//! Request and response bodies of the junction service.

use serde::{Deserialize, Serialize};

use crate::models::{AreaPolygon, Point, SignalId, SignalStats};

/// `GET /api/latest-stats/` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LatestStatsResponse {
    #[serde(default)]
    pub signals: Vec<SignalStats>,
}

/// `POST /api/save-area/` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveAreaRequest {
    pub signal_id: SignalId,
    pub area: Vec<Point>,
}

/// `GET /api/save-area/` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AreaResponse {
    #[serde(default)]
    pub signal_id: Option<SignalId>,
    pub area: AreaPolygon,
}

/// One raw video handed to `POST /api/log/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpload {
    pub signal_id: SignalId,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One element of the `POST /api/log/` response array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedVideo {
    pub signal_id: SignalId,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub vehicle_count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}
