pub mod config;
mod error;
mod graph_routes;
mod http_layers;
pub mod metrics;
mod semantic_routes;
pub mod server;
mod spotify_routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use http_layers::*;
pub use server::{make_app, make_metrics_app, run_server};
pub use state::ServerState;
