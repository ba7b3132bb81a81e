//! Blog API server: request pipeline, health reporting, and startup wiring.

pub mod api;
pub mod config;
pub mod pipeline;
pub mod state;

pub use config::Config;
pub use pipeline::build_router;
pub use state::AppState;
