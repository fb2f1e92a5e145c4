mod routes;

pub mod acquisition;
pub mod app;
pub mod classifier;
pub mod config;
pub mod orchestrator;
pub mod payload;
pub mod prediction;
pub mod render;
pub mod roster;
pub mod server;
pub mod telemetry;

pub use app::{build_state, start_app};
