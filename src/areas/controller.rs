use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    gateway::AreaGateway,
    state::{AreaSet, CapturePhase, CaptureProgress, CaptureState, CaptureView},
    CaptureError,
};
use crate::{
    dashboard::Dashboard,
    models::{Point, SignalId},
    point_store::PointStore,
};

/// Drives the area capture for the operator session: every edit lands in
/// the [`PointStore`] immediately, every commit goes through the
/// [`AreaGateway`], and the dashboard is kept in step.
#[derive(Clone)]
pub struct CaptureController {
    state: Arc<Mutex<CaptureState>>,
    store: Arc<PointStore>,
    gateway: AreaGateway,
    dashboard: Dashboard,
}

impl CaptureController {
    pub fn new(store: Arc<PointStore>, gateway: AreaGateway, dashboard: Dashboard) -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState::new())),
            store,
            gateway,
            dashboard,
        }
    }

    pub async fn phase(&self) -> CapturePhase {
        self.state.lock().await.phase()
    }

    pub async fn view(&self) -> Option<CaptureView> {
        self.state.lock().await.view()
    }

    /// Opens a capture session on signal A. All four feeds need a video
    /// source first.
    pub async fn start(&self) -> Result<CaptureView, CaptureError> {
        let missing = self.dashboard.read(|view| view.video_sources.missing());
        if !missing.is_empty() {
            let err = CaptureError::VideoSourcesMissing(missing);
            self.dashboard.warn(err.to_string());
            return Err(err);
        }

        let known: AreaSet = self.dashboard.read(|view| view.areas.clone());

        let mut state = self.state.lock().await;
        let first = state.begin(Uuid::new_v4().to_string(), known.clone())?;

        for signal in SignalId::ALL {
            if !known[signal.index()].is_empty() {
                self.drop_cache(signal);
            }
        }
        self.enter(&mut state, first);
        self.publish(&state);
        let view = state.view();
        drop(state);

        self.dashboard.info("Starting area selection process");
        view.ok_or(CaptureError::NoActiveSession)
    }

    pub async fn add_point(&self, point: Point) -> Result<CaptureView, CaptureError> {
        let mut state = self.state.lock().await;
        if state.add_point(point)? {
            if let (Some(signal), Some(polygon)) = (state.active_signal(), state.active_polygon()) {
                if let Err(err) = self.store.save(signal, polygon.points()) {
                    warn!("Failed to cache points for signal {signal}: {err:#}");
                }
            }
        }
        self.publish(&state);
        state.view().ok_or(CaptureError::NoActiveSession)
    }

    pub async fn reset(&self) -> Result<CaptureView, CaptureError> {
        let mut state = self.state.lock().await;
        let signal = state.reset()?;
        self.drop_cache(signal);
        self.publish(&state);
        state.view().ok_or(CaptureError::NoActiveSession)
    }

    /// Saves the active polygon and moves to the next signal. On failure the
    /// session stays on the same signal with its points intact.
    pub async fn commit(&self) -> Result<CaptureProgress, CaptureError> {
        let mut state = self.state.lock().await;
        let (signal, points) = state.ready_to_commit()?;

        state.set_saving(true);
        self.publish(&state);

        if let Err(err) = self.gateway.save(signal, &points).await {
            state.set_saving(false);
            self.publish(&state);
            self.dashboard
                .error(format!("Failed to save area for Signal {signal}: {err}"));
            return Err(err.into());
        }

        self.drop_cache(signal);
        let committed = state.active_polygon().cloned().unwrap_or_default();
        self.dashboard
            .update(|view| view.areas[signal.index()] = committed);

        let progress = state.advance()?;
        match progress {
            CaptureProgress::Next(next) => {
                self.enter(&mut state, next);
                self.dashboard.info(format!(
                    "Area for Signal {signal} saved successfully. Moving to next signal."
                ));
            }
            CaptureProgress::Completed => {
                self.dashboard.info("All signal areas configured successfully");
            }
        }
        self.publish(&state);
        Ok(progress)
    }

    /// Abandons the session and forgets every cached point.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        let was_active = state.cancel();
        if let Err(err) = self.store.clear_all() {
            warn!("Failed to clear cached points: {err:#}");
        }
        self.publish(&state);
        drop(state);

        if was_active {
            self.dashboard.info("Area selection cancelled");
        }
    }

    /// Takes areas confirmed by the service. Each non-empty one replaces the
    /// dashboard's committed area and wins over cached points for the same
    /// signal; an empty one leaves what is already known.
    pub async fn preload(&self, loaded: AreaSet) {
        let mut state = self.state.lock().await;
        let overridden = state.preload(&loaded);
        for signal in &overridden {
            self.drop_cache(*signal);
        }
        self.dashboard.update(|view| {
            for signal in &overridden {
                view.areas[signal.index()] = loaded[signal.index()].clone();
            }
        });
        self.publish(&state);
    }

    /// Fetches all four committed areas and preloads them.
    pub async fn load_areas(&self) -> usize {
        self.dashboard.info("Loading saved areas...");
        let loaded = self.gateway.load_all().await;
        let found = loaded.iter().filter(|area| !area.is_empty()).count();
        self.preload(loaded).await;
        self.dashboard
            .info(format!("Areas loaded successfully ({found} of 4 signals)"));
        found
    }

    fn enter(&self, state: &mut CaptureState, signal: SignalId) {
        if state.restore_active(self.store.load(signal)) {
            info!("Restored cached points for signal {signal}");
        }
    }

    fn drop_cache(&self, signal: SignalId) {
        if let Err(err) = self.store.clear(signal) {
            warn!("Failed to clear cached points for signal {signal}: {err:#}");
        }
    }

    fn publish(&self, state: &CaptureState) {
        let capture = state.view();
        self.dashboard.update(|view| view.capture = capture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ApiResult, AreaBackend};
    use crate::models::AreaPolygon;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingAreas {
        saved: StdMutex<Vec<(SignalId, Vec<Point>)>>,
        reject_saves: StdMutex<bool>,
        stored: StdMutex<Vec<(SignalId, AreaPolygon)>>,
    }

    #[async_trait]
    impl AreaBackend for RecordingAreas {
        async fn save_area(&self, signal: SignalId, area: &[Point]) -> ApiResult<()> {
            if *self.reject_saves.lock().unwrap() {
                return Err(ApiError::Server {
                    status: 500,
                    message: "disk full".into(),
                });
            }
            self.saved.lock().unwrap().push((signal, area.to_vec()));
            Ok(())
        }

        async fn fetch_area(&self, signal: SignalId) -> ApiResult<Option<AreaPolygon>> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .iter()
                .find(|(s, _)| *s == signal)
                .map(|(_, area)| area.clone()))
        }
    }

    fn square() -> Vec<Point> {
        vec![
            Point::new(10, 10),
            Point::new(100, 10),
            Point::new(100, 100),
            Point::new(10, 100),
        ]
    }

    fn configured_dashboard() -> Dashboard {
        let dashboard = Dashboard::new();
        dashboard.update(|view| {
            for signal in SignalId::ALL {
                view.video_sources.set(signal, format!("file:///{signal}.mp4"));
            }
        });
        dashboard
    }

    fn controller_with(
        backend: Arc<RecordingAreas>,
        store: Arc<PointStore>,
    ) -> (CaptureController, Dashboard) {
        let dashboard = configured_dashboard();
        let controller =
            CaptureController::new(store, AreaGateway::new(backend), dashboard.clone());
        (controller, dashboard)
    }

    async fn click_square(controller: &CaptureController) {
        for point in square() {
            controller.add_point(point).await.unwrap();
        }
    }

    #[tokio::test]
    async fn commit_sends_points_in_click_order_and_advances() {
        let backend = Arc::new(RecordingAreas::default());
        let store = Arc::new(PointStore::in_memory());
        let (controller, dashboard) = controller_with(backend.clone(), store.clone());

        controller.start().await.unwrap();
        click_square(&controller).await;
        assert_eq!(store.load(SignalId::A), Some(square()));

        let progress = controller.commit().await.unwrap();

        assert_eq!(progress, CaptureProgress::Next(SignalId::B));
        assert_eq!(
            backend.saved.lock().unwrap().as_slice(),
            &[(SignalId::A, square())]
        );
        assert_eq!(store.load(SignalId::A), None);
        assert_eq!(controller.phase().await, CapturePhase::Collecting(SignalId::B));
        assert!(dashboard.read(|view| view.area(SignalId::A).is_complete()));
    }

    #[tokio::test]
    async fn incomplete_commit_is_a_validation_failure() {
        let backend = Arc::new(RecordingAreas::default());
        let (controller, _) = controller_with(backend.clone(), Arc::new(PointStore::in_memory()));

        controller.start().await.unwrap();
        controller.add_point(Point::new(1, 1)).await.unwrap();

        assert_matches!(
            controller.commit().await,
            Err(CaptureError::IncompleteSelection { signal: SignalId::A, points: 1 })
        );
        assert_eq!(controller.phase().await, CapturePhase::Collecting(SignalId::A));
        assert!(backend.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_signal_and_points() {
        let backend = Arc::new(RecordingAreas::default());
        *backend.reject_saves.lock().unwrap() = true;
        let store = Arc::new(PointStore::in_memory());
        let (controller, dashboard) = controller_with(backend.clone(), store.clone());

        controller.start().await.unwrap();
        click_square(&controller).await;

        let err = controller.commit().await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");

        let view = controller.view().await.unwrap();
        assert_eq!(view.active_signal, SignalId::A);
        assert_eq!(view.points.points(), square().as_slice());
        assert!(!view.saving);
        assert_eq!(store.load(SignalId::A), Some(square()));
        assert!(dashboard.read(|v| v.log.render()).contains("[ERROR] Failed to save area for Signal A: disk full"));

        *backend.reject_saves.lock().unwrap() = false;
        assert_eq!(
            controller.commit().await.unwrap(),
            CaptureProgress::Next(SignalId::B)
        );
    }

    #[tokio::test]
    async fn last_signal_completes_the_session() {
        let backend = Arc::new(RecordingAreas::default());
        let (controller, dashboard) =
            controller_with(backend.clone(), Arc::new(PointStore::in_memory()));

        controller.start().await.unwrap();
        let mut last = None;
        for _ in SignalId::ALL {
            click_square(&controller).await;
            last = Some(controller.commit().await.unwrap());
        }

        assert_eq!(last, Some(CaptureProgress::Completed));
        assert_eq!(controller.phase().await, CapturePhase::Idle);
        assert_eq!(backend.saved.lock().unwrap().len(), 4);
        let view = dashboard.snapshot();
        assert!(view.capture.is_none());
        assert_eq!(
            view.log.last().map(ToString::to_string).as_deref(),
            Some("[INFO] All signal areas configured successfully")
        );
    }

    #[tokio::test]
    async fn reset_clears_points_and_cache() {
        let store = Arc::new(PointStore::in_memory());
        let (controller, _) = controller_with(Arc::new(RecordingAreas::default()), store.clone());

        controller.start().await.unwrap();
        controller.add_point(Point::new(4, 4)).await.unwrap();

        let view = controller.reset().await.unwrap();
        assert!(view.points.is_empty());
        assert_eq!(store.load(SignalId::A), None);

        let again = controller.reset().await.unwrap();
        assert!(again.points.is_empty());
    }

    #[tokio::test]
    async fn in_progress_points_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");

        {
            let store = Arc::new(PointStore::new(path.clone()).unwrap());
            let (controller, _) = controller_with(Arc::new(RecordingAreas::default()), store);
            controller.start().await.unwrap();
            controller.add_point(Point::new(10, 10)).await.unwrap();
            controller.add_point(Point::new(100, 10)).await.unwrap();
        }

        let store = Arc::new(PointStore::new(path).unwrap());
        let (controller, _) = controller_with(Arc::new(RecordingAreas::default()), store);
        let view = controller.start().await.unwrap();
        assert_eq!(view.points.points(), &square()[..2]);
    }

    #[tokio::test]
    async fn cancel_forgets_every_cached_signal() {
        let store = Arc::new(PointStore::in_memory());
        store.save(SignalId::C, &square()[..1]).unwrap();
        let (controller, dashboard) =
            controller_with(Arc::new(RecordingAreas::default()), store.clone());

        controller.start().await.unwrap();
        controller.add_point(Point::new(1, 1)).await.unwrap();
        controller.cancel().await;

        assert_eq!(controller.phase().await, CapturePhase::Idle);
        assert!(SignalId::ALL.iter().all(|s| store.load(*s).is_none()));
        assert!(dashboard.read(|v| v.log.render()).ends_with("[INFO] Area selection cancelled"));
        assert_matches!(
            controller.add_point(Point::new(1, 1)).await,
            Err(CaptureError::NoActiveSession)
        );
    }

    #[tokio::test]
    async fn server_areas_win_over_cached_points() {
        let backend = Arc::new(RecordingAreas::default());
        backend
            .stored
            .lock()
            .unwrap()
            .push((SignalId::A, AreaPolygon::try_from(square()).unwrap()));
        let store = Arc::new(PointStore::in_memory());
        store.save(SignalId::A, &[Point::new(7, 7)]).unwrap();
        store.save(SignalId::B, &[Point::new(8, 8)]).unwrap();
        let (controller, dashboard) = controller_with(backend, store.clone());

        assert_eq!(controller.load_areas().await, 1);
        assert_eq!(store.load(SignalId::A), None);
        assert!(store.load(SignalId::B).is_some());

        let view = controller.start().await.unwrap();
        assert_eq!(view.points.points(), square().as_slice());
        assert!(dashboard.read(|v| v.area(SignalId::A).is_complete()));

        controller.commit().await.unwrap();
        let view = controller.view().await.unwrap();
        assert_eq!(view.points.points(), &[Point::new(8, 8)]);
    }

    #[tokio::test]
    async fn unavailable_area_keeps_the_committed_one() {
        let backend = Arc::new(RecordingAreas::default());
        let (controller, dashboard) =
            controller_with(backend.clone(), Arc::new(PointStore::in_memory()));

        controller.start().await.unwrap();
        click_square(&controller).await;
        controller.commit().await.unwrap();
        controller.cancel().await;

        assert_eq!(controller.load_areas().await, 0);
        assert_eq!(dashboard.read(|v| v.area(SignalId::A).points().to_vec()), square());

        let view = controller.start().await.unwrap();
        assert_eq!(view.points.points(), square().as_slice());
    }

    #[tokio::test]
    async fn start_needs_all_video_sources() {
        let dashboard = Dashboard::new();
        dashboard.update(|view| view.video_sources.set(SignalId::A, "a.mp4"));
        let controller = CaptureController::new(
            Arc::new(PointStore::in_memory()),
            AreaGateway::new(Arc::new(RecordingAreas::default())),
            dashboard.clone(),
        );

        assert_matches!(
            controller.start().await,
            Err(CaptureError::VideoSourcesMissing(missing)) if missing == vec![SignalId::B, SignalId::C, SignalId::D]
        );
        assert_eq!(controller.phase().await, CapturePhase::Idle);
    }
}
