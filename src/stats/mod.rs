pub mod aggregate;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
pub mod loop_worker;

pub use controller::StatsController;
pub use loop_worker::{PollOutcome, Poller};
