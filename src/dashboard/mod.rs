mod system_log;

pub use system_log::{LogEntry, LogLevel, SystemLog};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::{
    areas::CaptureView,
    models::{AreaPolygon, JunctionSummary, SignalId, SignalStats},
    video::VideoSources,
};

/// Everything the dashboard renders. Owned by [`Dashboard`]; views only
/// ever see snapshots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub junction_id: Option<String>,
    pub signals: [SignalStats; 4],
    pub summary: JunctionSummary,
    pub video_sources: VideoSources,
    /// Committed areas as last confirmed by the service.
    pub areas: [AreaPolygon; 4],
    pub capture: Option<CaptureView>,
    pub last_updated: Option<DateTime<Utc>>,
    pub log: SystemLog,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            junction_id: None,
            signals: SignalStats::initial_set(),
            summary: JunctionSummary {
                active_signal: Some(SignalId::first()),
                ..JunctionSummary::default()
            },
            video_sources: VideoSources::default(),
            areas: Default::default(),
            capture: None,
            last_updated: None,
            log: SystemLog::default(),
        }
    }
}

impl DashboardView {
    pub fn signal(&self, signal: SignalId) -> &SignalStats {
        &self.signals[signal.index()]
    }

    pub fn area(&self, signal: SignalId) -> &AreaPolygon {
        &self.areas[signal.index()]
    }
}

/// Single writer of the [`DashboardView`]. Every change is pushed to
/// subscribers as a fresh snapshot.
#[derive(Clone)]
pub struct Dashboard {
    tx: Arc<watch::Sender<DashboardView>>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        let mut view = DashboardView::default();
        view.log.push(LogLevel::Info, "System initialized successfully");
        let (tx, _rx) = watch::channel(view);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> DashboardView {
        self.tx.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&DashboardView) -> R) -> R {
        f(&*self.tx.borrow())
    }

    pub fn update(&self, f: impl FnOnce(&mut DashboardView)) {
        self.tx.send_modify(f);
    }

    pub fn junction_id(&self) -> Option<String> {
        self.read(|view| view.junction_id.clone())
    }

    pub fn info(&self, message: impl Into<String>) {
        self.append(LogLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.append(LogLevel::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.append(LogLevel::Error, message.into());
    }

    fn append(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Warn => log::warn!("{message}"),
            LogLevel::Error => log::error!("{message}"),
        }
        self.update(|view| view.log.push(level, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_idle_signals() {
        let dashboard = Dashboard::new();
        let view = dashboard.snapshot();
        assert_eq!(view.summary.total_vehicles, 0);
        assert_eq!(view.signal(SignalId::C).vehicles, 0);
        assert!(view.area(SignalId::A).is_empty());
        assert_eq!(
            view.log.last().map(ToString::to_string).as_deref(),
            Some("[INFO] System initialized successfully")
        );
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let dashboard = Dashboard::new();
        let mut rx = dashboard.subscribe();

        dashboard.update(|view| view.junction_id = Some("7".into()));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().junction_id.as_deref(), Some("7"));
        assert_eq!(dashboard.junction_id().as_deref(), Some("7"));
    }

    #[test]
    fn log_helpers_append_levels() {
        let dashboard = Dashboard::new();
        dashboard.warn("careful");
        dashboard.error("broken");
        let rendered = dashboard.read(|view| view.log.render());
        assert!(rendered.ends_with("[WARN] careful\n[ERROR] broken"));
    }
}
