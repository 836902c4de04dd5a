pub mod area;
pub mod signal;
pub mod stats;

pub use area::{AreaPolygon, Point, AREA_POINTS, SURFACE_HEIGHT, SURFACE_WIDTH};
pub use signal::SignalId;
pub use stats::{Junction, JunctionSummary, SignalStats, SignalStatus};
