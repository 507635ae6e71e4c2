//! Graph views for visualization.

use axum::{extract::State, routing::get, Json, Router};

use super::error::ApiResult;
use super::state::{GuardedGraphStore, ServerState};
use crate::queries::{artist_graph, artist_graph_query, genre_graph, genre_graph_query, GraphView};

async fn get_genre_graph(State(store): State<GuardedGraphStore>) -> ApiResult<Json<GraphView>> {
    let results = store.select(&genre_graph_query()).await?;
    Ok(Json(genre_graph(&results)))
}

async fn get_artist_graph(State(store): State<GuardedGraphStore>) -> ApiResult<Json<GraphView>> {
    let results = store.select(&artist_graph_query()).await?;
    Ok(Json(artist_graph(&results)))
}

pub fn make_graph_routes(state: ServerState) -> Router {
    Router::new()
        .route("/genre/graph", get(get_genre_graph))
        .route("/artist/graph", get(get_artist_graph))
        .with_state(state)
}
