use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::time::Duration;

use crate::{
    api::{ApiResult, AreaBackend, DirectoryBackend, JunctionApi, StatsBackend, VideoBackend},
    areas::{AreaGateway, CaptureController},
    config::ConsoleConfig,
    dashboard::Dashboard,
    models::{Junction, JunctionSummary, SignalId, SignalStats},
    point_store::PointStore,
    stats::StatsController,
    video::VideoController,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// The service endpoints the console talks to.
#[derive(Clone)]
pub struct Backends {
    pub areas: Arc<dyn AreaBackend>,
    pub stats: Arc<dyn StatsBackend>,
    pub videos: Arc<dyn VideoBackend>,
    pub directory: Arc<dyn DirectoryBackend>,
}

impl Backends {
    /// Every endpoint served by one HTTP client.
    pub fn http(api: JunctionApi) -> Self {
        let api = Arc::new(api);
        Self {
            areas: api.clone(),
            stats: api.clone(),
            videos: api.clone(),
            directory: api,
        }
    }
}

/// Operator session: the dashboard plus the controllers that write to it.
#[derive(Clone)]
pub struct Console {
    dashboard: Dashboard,
    capture: CaptureController,
    stats: StatsController,
    video: VideoController,
    directory: Arc<dyn DirectoryBackend>,
}

impl Console {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory {}", config.data_dir.display())
        })?;

        let api = JunctionApi::new(config.api_base_url.clone(), config.request_timeout)?;
        let store = PointStore::new(config.point_cache_path())?;

        log_info!("Junction service at {}", api.base_url());
        Ok(Self::with_backends(
            Backends::http(api),
            Arc::new(store),
            config.poll_interval,
        ))
    }

    pub fn with_backends(backends: Backends, store: Arc<PointStore>, poll_interval: Duration) -> Self {
        let dashboard = Dashboard::new();
        Self {
            capture: CaptureController::new(
                store,
                AreaGateway::new(backends.areas),
                dashboard.clone(),
            ),
            stats: StatsController::new(backends.stats, dashboard.clone(), poll_interval),
            video: VideoController::new(backends.videos, dashboard.clone()),
            directory: backends.directory,
            dashboard,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    pub fn stats(&self) -> &StatsController {
        &self.stats
    }

    pub fn video(&self) -> &VideoController {
        &self.video
    }

    pub async fn list_junctions(&self) -> ApiResult<Vec<Junction>> {
        self.directory.list_junctions().await
    }

    /// Switches the dashboard to `junction_id`: telemetry starts over, the
    /// committed areas are reloaded and polling restarts. Returns how many
    /// signals have a saved area.
    pub async fn select_junction(&self, junction_id: String) -> Result<usize> {
        self.stats.stop().await?;

        self.dashboard.update(|view| {
            view.junction_id = Some(junction_id.clone());
            reset_telemetry(&mut view.signals, &mut view.summary);
            view.last_updated = None;
        });
        self.dashboard.info(format!("Junction {junction_id} selected"));

        let started = self.stats.start(junction_id.clone()).await;
        if let Err(err) = &started {
            log_error!("could not start stats polling for junction {junction_id}: {err:#}");
        }
        let found = self.capture.load_areas().await;
        started?;
        Ok(found)
    }

    /// Leaves the current junction and stops polling.
    pub async fn clear_junction(&self) -> Result<()> {
        self.stats.stop().await?;
        let previous = self.dashboard.junction_id();
        self.dashboard.update(|view| {
            view.junction_id = None;
            reset_telemetry(&mut view.signals, &mut view.summary);
            view.last_updated = None;
        });
        if let Some(previous) = previous {
            self.dashboard.info(format!("Junction {previous} deselected"));
        }
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.stats.stop().await
    }
}

fn reset_telemetry(signals: &mut [SignalStats; 4], summary: &mut JunctionSummary) {
    *signals = SignalStats::initial_set();
    *summary = JunctionSummary {
        active_signal: Some(SignalId::first()),
        ..JunctionSummary::default()
    };
}
