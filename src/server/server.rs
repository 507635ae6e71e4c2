use anyhow::{Context, Result};
use std::time::Duration;

use tracing::info;

use axum::{
    extract::State, middleware, response::IntoResponse, routing::get, Json, Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;

use super::graph_routes::make_graph_routes;
use super::metrics::metrics_handler;
use super::semantic_routes::make_semantic_routes;
use super::spotify_routes::make_spotify_routes;
use super::{log_requests, state::ServerState};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

pub fn make_app(state: ServerState) -> Router {
    let api_routes: Router = Router::new()
        .nest("/spotify", make_spotify_routes(state.clone()))
        .nest("/semantic", make_semantic_routes(state.clone()))
        .merge(make_graph_routes(state.clone()));

    let home_router: Router = match state.config.frontend_dir_path.clone() {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Serves the API and the metrics endpoint until the state's shutdown token
/// is cancelled.
pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    let metrics_port = state.config.metrics_port;
    let shutdown = state.shutdown.clone();

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    let app = make_app(state);
    let app_shutdown = shutdown.clone();
    let app_server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { app_shutdown.cancelled().await })
            .await
    };
    let metrics_server = async move {
        axum::serve(metrics_listener, make_metrics_app())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
    };

    tokio::try_join!(app_server, metrics_server)?;
    info!("Servers stopped");
    Ok(())
}
