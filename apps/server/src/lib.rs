pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
mod main_lib;

pub use main_lib::{build_state, build_state_with_clock, init_tracing, AppState};
