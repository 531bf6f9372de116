//! CLI command implementations.

mod config;
mod doctor;
mod extract;
mod search;

pub use config::run_config;
pub use doctor::run_doctor;
pub use extract::{apply_overrides, run_extract};
pub use search::run_search;
