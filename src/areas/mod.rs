#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
mod error;
pub mod gateway;
pub mod state;

pub use controller::CaptureController;
pub use error::CaptureError;
pub use gateway::AreaGateway;
pub use state::{AreaSet, CapturePhase, CaptureProgress, CaptureState, CaptureView};
