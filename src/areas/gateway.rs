use std::sync::Arc;

use log::{debug, info, warn};

use super::state::AreaSet;
use crate::api::{ApiError, ApiResult, AreaBackend};
use crate::models::{AreaPolygon, Point, SignalId, AREA_POINTS};

/// Load and save of committed areas.
///
/// Saving reports every failure. Loading is best-effort per signal: a
/// signal that cannot be fetched comes back empty and the rest still load.
#[derive(Clone)]
pub struct AreaGateway {
    backend: Arc<dyn AreaBackend>,
}

impl AreaGateway {
    pub fn new(backend: Arc<dyn AreaBackend>) -> Self {
        Self { backend }
    }

    pub async fn save(&self, signal: SignalId, points: &[Point]) -> ApiResult<()> {
        if points.len() != AREA_POINTS {
            return Err(ApiError::Validation(format!(
                "Please select exactly {AREA_POINTS} points"
            )));
        }

        self.backend.save_area(signal, points).await?;
        info!("Area for signal {signal} committed");
        Ok(())
    }

    pub async fn load(&self, signal: SignalId) -> AreaPolygon {
        match self.backend.fetch_area(signal).await {
            Ok(Some(area)) => area,
            Ok(None) => {
                debug!("No area stored for signal {signal}");
                AreaPolygon::new()
            }
            Err(err) => {
                warn!("Error loading area for signal {signal}: {err}");
                AreaPolygon::new()
            }
        }
    }

    /// Loads every signal independently.
    pub async fn load_all(&self) -> AreaSet {
        let (a, b, c, d) = tokio::join!(
            self.load(SignalId::A),
            self.load(SignalId::B),
            self.load(SignalId::C),
            self.load(SignalId::D),
        );
        [a, b, c, d]
    }
}
