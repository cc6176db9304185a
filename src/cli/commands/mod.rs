//! CLI command implementations.

mod config;
mod research;
mod serve;

pub use config::run_config;
pub use research::run_research;
pub use serve::{router, run_serve, AppState};
