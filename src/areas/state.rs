use serde::{Deserialize, Serialize};

use super::CaptureError;
use crate::models::{AreaPolygon, Point, SignalId};

/// Areas for all four signals, indexed by [`SignalId::index`].
pub type AreaSet = [AreaPolygon; 4];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "phase", content = "signal")]
pub enum CapturePhase {
    Idle,
    Collecting(SignalId),
}

impl Default for CapturePhase {
    fn default() -> Self {
        CapturePhase::Idle
    }
}

/// Where a successful commit left the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind", content = "signal")]
pub enum CaptureProgress {
    Next(SignalId),
    Completed,
}

/// What the area selector renders for the active signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureView {
    pub session_id: String,
    pub active_signal: SignalId,
    pub points: AreaPolygon,
    pub saving: bool,
}

#[derive(Debug, Clone)]
struct CaptureSession {
    id: String,
    active: SignalId,
    polygons: AreaSet,
    saving: bool,
}

impl CaptureSession {
    fn active_polygon_mut(&mut self) -> &mut AreaPolygon {
        &mut self.polygons[self.active.index()]
    }
}

/// Per-signal quadrilateral collector. Idle until [`CaptureState::begin`],
/// then collects signals A through D in order.
#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    session: Option<CaptureSession>,
}

impl CaptureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CapturePhase {
        match &self.session {
            Some(session) => CapturePhase::Collecting(session.active),
            None => CapturePhase::Idle,
        }
    }

    pub fn active_signal(&self) -> Option<SignalId> {
        self.session.as_ref().map(|session| session.active)
    }

    pub fn active_polygon(&self) -> Option<&AreaPolygon> {
        self.session
            .as_ref()
            .map(|session| &session.polygons[session.active.index()])
    }

    pub fn polygon(&self, signal: SignalId) -> Option<&AreaPolygon> {
        self.session
            .as_ref()
            .map(|session| &session.polygons[signal.index()])
    }

    pub fn view(&self) -> Option<CaptureView> {
        self.session.as_ref().map(|session| CaptureView {
            session_id: session.id.clone(),
            active_signal: session.active,
            points: session.polygons[session.active.index()].clone(),
            saving: session.saving,
        })
    }

    /// Opens a session on the first signal, pre-populated with `known`.
    pub fn begin(&mut self, session_id: String, known: AreaSet) -> Result<SignalId, CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::SessionActive);
        }
        let first = SignalId::first();
        self.session = Some(CaptureSession {
            id: session_id,
            active: first,
            polygons: known,
            saving: false,
        });
        Ok(first)
    }

    /// Seeds the active polygon from cached points when it has nothing of
    /// its own. Returns whether anything was restored.
    pub fn restore_active(&mut self, cached: Option<Vec<Point>>) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let polygon = session.active_polygon_mut();
        match cached {
            Some(points) if polygon.is_empty() && !points.is_empty() => {
                *polygon = AreaPolygon::truncated(points);
                true
            }
            _ => false,
        }
    }

    /// Appends `point` to the active polygon. `Ok(false)` when the polygon
    /// already holds four points.
    pub fn add_point(&mut self, point: Point) -> Result<bool, CaptureError> {
        let session = self.session.as_mut().ok_or(CaptureError::NoActiveSession)?;
        if !point.within_surface() {
            return Err(CaptureError::OutOfSurface(point));
        }
        Ok(session.active_polygon_mut().push(point))
    }

    pub fn reset(&mut self) -> Result<SignalId, CaptureError> {
        let session = self.session.as_mut().ok_or(CaptureError::NoActiveSession)?;
        session.active_polygon_mut().clear();
        Ok(session.active)
    }

    /// The active signal and its points, provided the polygon is complete.
    pub fn ready_to_commit(&self) -> Result<(SignalId, Vec<Point>), CaptureError> {
        let session = self.session.as_ref().ok_or(CaptureError::NoActiveSession)?;
        let polygon = &session.polygons[session.active.index()];
        if !polygon.is_complete() {
            return Err(CaptureError::IncompleteSelection {
                signal: session.active,
                points: polygon.len(),
            });
        }
        Ok((session.active, polygon.points().to_vec()))
    }

    pub fn set_saving(&mut self, saving: bool) {
        if let Some(session) = self.session.as_mut() {
            session.saving = saving;
        }
    }

    /// Moves past a committed signal. The session ends after the last one.
    pub fn advance(&mut self) -> Result<CaptureProgress, CaptureError> {
        let session = self.session.as_mut().ok_or(CaptureError::NoActiveSession)?;
        session.saving = false;
        match session.active.next() {
            Some(next) => {
                session.active = next;
                Ok(CaptureProgress::Next(next))
            }
            None => {
                self.session = None;
                Ok(CaptureProgress::Completed)
            }
        }
    }

    /// Applies areas confirmed by the service. Non-empty entries replace the
    /// session's polygons; their signals are returned so the caller can drop
    /// any local cache for them.
    pub fn preload(&mut self, loaded: &AreaSet) -> Vec<SignalId> {
        let mut overridden = Vec::new();
        for signal in SignalId::ALL {
            let area = &loaded[signal.index()];
            if area.is_empty() {
                continue;
            }
            if let Some(session) = self.session.as_mut() {
                session.polygons[signal.index()] = area.clone();
            }
            overridden.push(signal);
        }
        overridden
    }

    /// Drops the session. Returns whether one was open.
    pub fn cancel(&mut self) -> bool {
        self.session.take().is_some()
    }
}
