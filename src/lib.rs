pub mod api;
pub mod areas;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod models;
pub mod point_store;
#[cfg(feature = "desktop")]
mod shell;
pub mod stats;
pub mod utils;
pub mod video;

pub use config::ConsoleConfig;
pub use console::{Backends, Console};
pub use dashboard::{Dashboard, DashboardView};

#[cfg(feature = "desktop")]
pub(crate) use shell::AppState;
#[cfg(feature = "desktop")]
pub use shell::run;
